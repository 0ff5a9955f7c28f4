//! Similarity retrieval over the active index.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::vector_index::{RetrievalResult, VectorIndex};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds a question and returns the most similar chunks of an index.
///
/// Must share its embedder with ingestion so question and chunk vectors come
/// from the same model.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            top_k: DEFAULT_TOP_K,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the retry policy for question embedding.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank the chunks of `index` against `question`, best first.
    #[instrument(skip(self, index), fields(entries = index.len()))]
    pub async fn retrieve(&self, index: &VectorIndex, question: &str) -> Result<RetrievalResult> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self
            .retry
            .run("question embedding", || self.embedder.embed(question))
            .await?;

        let results = index.search(&query, self.top_k)?;
        debug!(
            "Retrieved {} chunks (best score {:.3})",
            results.len(),
            results.first().map(|r| r.score).unwrap_or(0.0)
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;
    use crate::vector_index::tests::KeywordEmbedder;

    async fn build_index(embedder: &KeywordEmbedder, texts: &[&str]) -> VectorIndex {
        let chunks = texts.iter().map(|t| TranscriptChunk::new(*t)).collect();
        VectorIndex::build(chunks, embedder).await.unwrap()
    }

    #[tokio::test]
    async fn test_best_match_comes_first() {
        let embedder = Arc::new(KeywordEmbedder::new(&["rust", "python", "garden"]));
        let index = build_index(
            &embedder,
            &[
                "python is popular for data science",
                "rust has a borrow checker and rust is fast",
                "the garden needs water",
            ],
        )
        .await;

        let retriever = Retriever::new(embedder.clone());
        let results = retriever.retrieve(&index, "Why is rust fast?").await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].position, 1);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let embedder = Arc::new(KeywordEmbedder::new(&["a", "b"]));
        let texts: Vec<String> = (0..10).map(|i| format!("a{}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let index = build_index(&embedder, &refs).await;

        let retriever = Retriever::new(embedder.clone());
        assert_eq!(retriever.top_k(), DEFAULT_TOP_K);
        assert_eq!(retriever.retrieve(&index, "a").await.unwrap().len(), 4);

        let retriever = Retriever::new(embedder.clone()).with_top_k(2);
        assert_eq!(retriever.retrieve(&index, "a").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let embedder = Arc::new(KeywordEmbedder::new(&["a"]));
        let index = build_index(&embedder, &[]).await;
        let retriever = Retriever::new(embedder);
        assert!(retriever.retrieve(&index, "anything").await.unwrap().is_empty());
    }
}
