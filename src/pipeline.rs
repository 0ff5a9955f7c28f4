//! Pipeline orchestrator for Svar.
//!
//! Coordinates ingestion (fetch, chunk, embed, persist) and question answering
//! (retrieve, assemble, generate) against a single active index.
//!
//! The active index is an `Arc` behind a lock that is only held long enough to
//! clone or swap the pointer. Ingestion builds a complete new index before
//! swapping it in, so a query sees either the old index or the new one, never
//! a partial build. Ingestions are serialized; queries run concurrently.

use crate::chunking::{chunk_transcript, create_splitter, TextSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SvarError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::rag::{GroundingPrompt, RagResponse, Retriever, SourceChunk, DEFAULT_CONTEXT_SEPARATOR};
use crate::retry::RetryPolicy;
use crate::source::parse_video_id;
use crate::transcript::{format_timestamp, TranscriptSource, YoutubeTranscriptSource};
use crate::vector_index::{IndexMetadata, IndexStorage, SqliteIndexStorage, VectorIndex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

/// Lifecycle of the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No index has been built or restored.
    Empty,
    /// The first index is being built; queries fail with `IndexBusy`.
    Indexing,
    /// An index is available. `rebuilding` is set while a replacement is
    /// being built; queries keep using the current index meanwhile.
    Ready { rebuilding: bool },
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Empty => write!(f, "empty"),
            PipelineState::Indexing => write!(f, "indexing"),
            PipelineState::Ready { rebuilding: false } => write!(f, "ready"),
            PipelineState::Ready { rebuilding: true } => write!(f, "ready (rebuilding)"),
        }
    }
}

/// Snapshot of the pipeline for status reporting.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub state: PipelineState,
    /// Number of chunks in the active index.
    pub chunks: usize,
    /// Metadata of the active index, if any.
    pub metadata: Option<IndexMetadata>,
    /// Where the index is persisted.
    pub location: String,
}

/// Marks an ingestion as in flight until dropped, including on error or
/// cancellation.
struct IndexingGuard<'a>(&'a AtomicBool);

impl<'a> IndexingGuard<'a> {
    fn begin(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for IndexingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The ingestion and question-answering pipeline.
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    splitter: Box<dyn TextSplitter>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    storage: Arc<dyn IndexStorage>,
    retriever: Retriever,
    prompts: Prompts,
    language: String,
    context_separator: String,
    retry: RetryPolicy,
    active: RwLock<Option<Arc<VectorIndex>>>,
    indexing: AtomicBool,
    ingest_lock: tokio::sync::Mutex<()>,
}

impl Pipeline {
    /// Create a pipeline from settings, using YouTube captions, OpenAI
    /// services and SQLite persistence.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let source = Arc::new(YoutubeTranscriptSource::with_ytdlp(
            &settings.transcript.ytdlp_path,
        )?);
        let splitter = create_splitter(
            settings.chunking.strategy,
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        );
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding));
        let generator = Arc::new(OpenAIGenerator::from_settings(&settings.rag));
        let storage = Arc::new(SqliteIndexStorage::new(settings.index_path()));

        Ok(
            Self::with_components(source, splitter, embedder, generator, storage)
                .with_prompts(prompts)
                .with_language(&settings.transcript.language)
                .with_top_k(settings.rag.top_k)
                .with_context_separator(&settings.rag.context_separator)
                .with_retry(RetryPolicy::from_settings(&settings.retry)),
        )
    }

    /// Create a pipeline with custom components.
    ///
    /// The embedder is used for both chunks and questions.
    pub fn with_components(
        source: Arc<dyn TranscriptSource>,
        splitter: Box<dyn TextSplitter>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        storage: Arc<dyn IndexStorage>,
    ) -> Self {
        let retry = RetryPolicy::default();
        Self {
            source,
            splitter,
            retriever: Retriever::new(embedder.clone()).with_retry(retry),
            embedder,
            generator,
            storage,
            prompts: Prompts::default(),
            language: "en".to_string(),
            context_separator: DEFAULT_CONTEXT_SEPARATOR.to_string(),
            retry,
            active: RwLock::new(None),
            indexing: AtomicBool::new(false),
            ingest_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Set prompt templates.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the transcript language to request.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.retriever = self.retriever.with_top_k(top_k);
        self
    }

    /// Set the separator placed between retrieved chunks in the context.
    pub fn with_context_separator(mut self, separator: &str) -> Self {
        self.context_separator = separator.to_string();
        self
    }

    /// Set the retry policy for embedding and generation calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self.retriever = self.retriever.with_retry(retry);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        let indexing = self.indexing.load(Ordering::SeqCst);
        match self.current_index() {
            Ok(Some(_)) => PipelineState::Ready { rebuilding: indexing },
            _ if indexing => PipelineState::Indexing,
            _ => PipelineState::Empty,
        }
    }

    /// Status snapshot for reporting.
    pub fn status(&self) -> Result<PipelineStatus> {
        let index = self.current_index()?;
        Ok(PipelineStatus {
            state: self.state(),
            chunks: index.as_ref().map(|i| i.len()).unwrap_or(0),
            metadata: index.map(|i| i.metadata().clone()),
            location: self.storage.location(),
        })
    }

    /// Load the persisted index, if any, and make it active.
    ///
    /// Returns whether an index was restored. An index built with a different
    /// embedding model or dimensionality is ignored.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool> {
        let _lock = self.ingest_lock.lock().await;

        let index = match self.storage.load().await {
            Ok(index) => index,
            Err(SvarError::IndexNotFound(location)) => {
                debug!("No persisted index at {}", location);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let metadata = index.metadata();
        if metadata.embedding_model != self.embedder.model()
            || metadata.dimensions != self.embedder.dimensions()
        {
            warn!(
                "Ignoring persisted index built with {} ({} dims); current embedder is {} ({} dims)",
                metadata.embedding_model,
                metadata.dimensions,
                self.embedder.model(),
                self.embedder.dimensions()
            );
            return Ok(false);
        }

        info!(
            "Restored index {} with {} chunks from {}",
            metadata.id,
            index.len(),
            self.storage.location()
        );
        self.activate(index)?;
        Ok(true)
    }

    /// Ingest a video: fetch its transcript, chunk, embed, persist and make
    /// the new index active. Returns the number of chunks indexed.
    ///
    /// The previous index stays active and persisted if any step fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn ingest(&self, url: &str) -> Result<usize> {
        let video_id = parse_video_id(url)?;

        let _lock = self.ingest_lock.lock().await;
        let _indexing = IndexingGuard::begin(&self.indexing);

        info!("Fetching transcript for {} ({})", video_id, self.language);
        let transcript = self.source.fetch(&video_id, &self.language).await?;
        if transcript.is_empty() {
            return Err(SvarError::TranscriptUnavailable(format!(
                "Transcript for {} is empty",
                video_id
            )));
        }

        let chunks = chunk_transcript(self.splitter.as_ref(), &transcript);
        if chunks.is_empty() {
            return Err(SvarError::TranscriptUnavailable(format!(
                "Transcript for {} has no text",
                video_id
            )));
        }
        info!(
            "Split {} of transcript into {} chunks",
            format_timestamp(transcript.duration_seconds()),
            chunks.len()
        );

        let index = self
            .retry
            .run("chunk embedding", || {
                VectorIndex::build(chunks.clone(), self.embedder.as_ref())
            })
            .await?
            .with_source_id(&video_id);

        self.storage.replace(&index).await?;
        debug!("Persisted index to {}", self.storage.location());

        let count = index.len();
        self.activate(index)?;
        info!("Indexed {} chunks for {}", count, video_id);
        Ok(count)
    }

    /// Answer a question from the active index.
    pub async fn ask(&self, question: &str) -> Result<String> {
        Ok(self.ask_with_sources(question).await?.answer)
    }

    /// Answer a question and return the ranked chunks it was grounded on.
    ///
    /// Fails with `NoIndex` before anything has been ingested and with
    /// `IndexBusy` while the first index is still being built.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask_with_sources(&self, question: &str) -> Result<RagResponse> {
        let index = match self.current_index()? {
            Some(index) => index,
            None if self.indexing.load(Ordering::SeqCst) => return Err(SvarError::IndexBusy),
            None => return Err(SvarError::NoIndex),
        };

        let results = self.retriever.retrieve(&index, question).await?;
        let prompt = GroundingPrompt::assemble(&results, question, &self.context_separator)
            .render(&self.prompts);

        let answer = self
            .retry
            .run("answer generation", || self.generator.generate(&prompt))
            .await?;

        let video_id = index.metadata().source_id.as_deref();
        let sources = results
            .iter()
            .map(|r| SourceChunk::from_result(r, video_id))
            .collect();

        Ok(RagResponse { answer, sources })
    }

    fn current_index(&self) -> Result<Option<Arc<VectorIndex>>> {
        let active = self
            .active
            .read()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        Ok(active.clone())
    }

    fn activate(&self, index: VectorIndex) -> Result<()> {
        let mut active = self
            .active
            .write()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        *active = Some(Arc::new(index));
        Ok(())
    }
}
