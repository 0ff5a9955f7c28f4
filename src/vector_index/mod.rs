//! Vector index over transcript chunks.
//!
//! A [`VectorIndex`] is built in one go from a set of chunks, is immutable
//! afterwards, and answers exact nearest-neighbour queries by cosine
//! similarity. [`IndexStorage`] implementations persist and restore it.

mod memory;
mod sqlite;

pub use memory::MemoryIndexStorage;
pub use sqlite::SqliteIndexStorage;

use crate::chunking::TranscriptChunk;
use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Descriptive information stored with an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Unique ID of this build.
    pub id: Uuid,
    /// Identifier of the source the chunks came from (e.g. a video ID).
    pub source_id: Option<String>,
    /// Embedding model that produced the vectors.
    pub embedding_model: String,
    /// Dimensionality shared by every vector in the index.
    pub dimensions: usize,
    /// When the index was built.
    pub created_at: DateTime<Utc>,
}

impl IndexMetadata {
    pub fn new(embedding_model: &str, dimensions: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: None,
            embedding_model: embedding_model.to_string(),
            dimensions,
            created_at: Utc::now(),
        }
    }
}

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub chunk: TranscriptChunk,
    pub embedding: Vec<f32>,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: TranscriptChunk,
    /// Similarity score (higher is better).
    pub score: f32,
    /// Insertion position of the chunk in the index.
    pub position: usize,
}

/// Chunks ranked by similarity to a query, best first.
pub type RetrievalResult = Vec<SearchResult>;

/// Immutable, searchable collection of embedded chunks.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metadata: IndexMetadata,
    entries: Vec<IndexedVector>,
}

impl VectorIndex {
    /// Create an index from already-embedded entries.
    ///
    /// Every embedding must have `metadata.dimensions` components.
    pub fn from_parts(metadata: IndexMetadata, entries: Vec<IndexedVector>) -> Result<Self> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.embedding.len() != metadata.dimensions)
        {
            return Err(SvarError::DimensionMismatch {
                expected: metadata.dimensions,
                actual: bad.embedding.len(),
            });
        }
        Ok(Self { metadata, entries })
    }

    /// Embed every chunk and build a fresh index.
    ///
    /// Fails with `Embedding` if the service fails or returns vectors of the
    /// wrong count or dimensionality.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(chunks: Vec<TranscriptChunk>, embedder: &dyn Embedder) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(SvarError::Embedding(format!(
                "Expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(SvarError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                dimensions,
                bad.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedVector { chunk, embedding })
            .collect::<Vec<_>>();

        debug!("Built index with {} entries", entries.len());
        Self::from_parts(IndexMetadata::new(embedder.model(), dimensions), entries)
    }

    /// Record which source the index was built from.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.metadata.source_id = Some(source_id.into());
        self
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// Equal scores keep insertion order. Asking for more entries than the
    /// index holds returns all of them; an empty index returns nothing.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.metadata.dimensions {
            return Err(SvarError::DimensionMismatch {
                expected: self.metadata.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(query, &entry.embedding)))
            .collect();

        // `sort_by` is stable, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchResult {
                chunk: self.entries[position].chunk.clone(),
                score,
                position,
            })
            .collect())
    }
}

/// Durable storage for the single active index.
#[async_trait]
pub trait IndexStorage: Send + Sync {
    /// Replace any stored index with `index`.
    async fn replace(&self, index: &VectorIndex) -> Result<()>;

    /// Load the stored index. Fails with `IndexNotFound` if there is none.
    async fn load(&self) -> Result<VectorIndex>;

    /// Human-readable location, for logs and status output.
    fn location(&self) -> String;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic embedder: one dimension per keyword, counting occurrences.
    pub(crate) struct KeywordEmbedder {
        pub keywords: Vec<&'static str>,
    }

    impl KeywordEmbedder {
        pub fn new(keywords: &[&'static str]) -> Self {
            Self {
                keywords: keywords.to_vec(),
            }
        }

        pub fn vector(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            self.keywords
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            self.keywords.len()
        }

        fn model(&self) -> &str {
            "keyword-test"
        }
    }

    pub(crate) fn sample_index() -> VectorIndex {
        let metadata = IndexMetadata::new("test", 3);
        let entries = vec![
            IndexedVector {
                chunk: TranscriptChunk::new("alpha").with_offset(0),
                embedding: vec![1.0, 0.0, 0.0],
            },
            IndexedVector {
                chunk: TranscriptChunk::new("beta").with_offset(6),
                embedding: vec![0.0, 1.0, 0.0],
            },
            IndexedVector {
                chunk: TranscriptChunk::new("gamma").with_offset(11),
                embedding: vec![0.7, 0.7, 0.0],
            },
        ];
        VectorIndex::from_parts(metadata, entries).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = sample_index();
        let results = index.search(&[0.0, 1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["beta", "gamma", "alpha"]);
        assert_eq!(results[0].position, 1);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 10).unwrap().len(), 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::from_parts(IndexMetadata::new("test", 3), Vec::new()).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 4).unwrap().is_empty());
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let entries = (0..5)
            .map(|i| IndexedVector {
                chunk: TranscriptChunk::new(format!("chunk {}", i)),
                embedding: vec![1.0, 1.0],
            })
            .collect();
        let index = VectorIndex::from_parts(IndexMetadata::new("test", 2), entries).unwrap();

        let positions: Vec<usize> = index
            .search(&[1.0, 1.0], 4)
            .unwrap()
            .iter()
            .map(|r| r.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 2),
            Err(SvarError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_dimensions() {
        let entries = vec![IndexedVector {
            chunk: TranscriptChunk::new("x"),
            embedding: vec![1.0, 2.0],
        }];
        assert!(VectorIndex::from_parts(IndexMetadata::new("test", 3), entries).is_err());
    }

    #[tokio::test]
    async fn test_build_embeds_every_chunk() {
        let embedder = KeywordEmbedder::new(&["cat", "dog", "fish"]);
        let chunks = vec![
            TranscriptChunk::new("the cat sat"),
            TranscriptChunk::new("a dog barked at the dog"),
        ];

        let index = VectorIndex::build(chunks, &embedder)
            .await
            .unwrap()
            .with_source_id("vid");

        assert_eq!(index.len(), 2);
        assert_eq!(index.metadata().dimensions, 3);
        assert_eq!(index.metadata().embedding_model, "keyword-test");
        assert_eq!(index.metadata().source_id.as_deref(), Some("vid"));
        assert_eq!(index.entries()[1].embedding, vec![0.0, 2.0, 0.0]);
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_build_rejects_dimension_mismatch() {
        let result = VectorIndex::build(vec![TranscriptChunk::new("text")], &ShortEmbedder).await;
        assert!(matches!(result, Err(SvarError::Embedding(_))));
    }
}
