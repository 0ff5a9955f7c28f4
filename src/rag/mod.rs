//! Retrieval-augmented answering.
//!
//! [`Retriever`] ranks indexed chunks against a question, [`GroundingPrompt`]
//! turns the ranking into the prompt sent to the generator, and
//! [`RagResponse`] carries the answer back with the chunks it was grounded on.

mod prompt;
mod retriever;

pub use prompt::{GroundingPrompt, DEFAULT_CONTEXT_SEPARATOR};
pub use retriever::{Retriever, DEFAULT_TOP_K};

use crate::source::watch_url;
use crate::transcript::format_timestamp;
use crate::vector_index::SearchResult;

/// A retrieved chunk formatted for display.
#[derive(Debug, Clone)]
pub struct SourceChunk {
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// Start time in seconds, when the transcript had timings.
    pub start_seconds: Option<f64>,
    /// Link to the video at this chunk, when the source is known.
    pub url: Option<String>,
}

impl SourceChunk {
    pub fn from_result(result: &SearchResult, video_id: Option<&str>) -> Self {
        let start_seconds = result.chunk.start_seconds;
        let url = video_id.map(|id| match start_seconds {
            Some(start) => format!("{}&t={}s", watch_url(id), start as u32),
            None => watch_url(id),
        });

        Self {
            content: result.chunk.text.clone(),
            score: result.score,
            start_seconds,
            url,
        }
    }

    /// Formatted timestamp (e.g., "02:34"), if known.
    pub fn timestamp(&self) -> Option<String> {
        self.start_seconds.map(format_timestamp)
    }
}

/// An answer together with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<SourceChunk>,
}
