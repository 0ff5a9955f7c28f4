//! Transcript chunking.
//!
//! Splits the joined transcript text into bounded, overlapping chunks that are
//! embedded and retrieved individually. Splitting policies implement
//! [`TextSplitter`] so alternatives can be swapped in without touching the
//! pipeline.

mod recursive;
mod window;

pub use recursive::RecursiveSplitter;
pub use window::WindowSplitter;

use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// A chunk of transcript text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Text content of this chunk.
    pub text: String,
    /// Byte offset of the chunk in the source text.
    pub offset: Option<usize>,
    /// Start time in the video (seconds), when known.
    pub start_seconds: Option<f64>,
}

impl TranscriptChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            offset: None,
            start_seconds: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A text splitting policy.
pub trait TextSplitter: Send + Sync {
    /// Split `text` into ordered, non-empty chunks.
    fn split(&self, text: &str) -> Vec<TranscriptChunk>;
}

/// Splitting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Split on paragraph, line, sentence, then word boundaries.
    #[default]
    Recursive,
    /// Fixed-size character windows.
    Window,
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(SplitStrategy::Recursive),
            "window" => Ok(SplitStrategy::Window),
            _ => Err(format!("Unknown split strategy: {}", s)),
        }
    }
}

/// Create a splitter for the strategy.
pub fn create_splitter(
    strategy: SplitStrategy,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Box<dyn TextSplitter> {
    match strategy {
        SplitStrategy::Recursive => Box::new(RecursiveSplitter::new(chunk_size, chunk_overlap)),
        SplitStrategy::Window => Box::new(WindowSplitter::new(chunk_size, chunk_overlap)),
    }
}

/// Split a transcript and attach the video time each chunk starts at.
pub fn chunk_transcript(splitter: &dyn TextSplitter, transcript: &Transcript) -> Vec<TranscriptChunk> {
    splitter
        .split(&transcript.text)
        .into_iter()
        .map(|mut chunk| {
            chunk.start_seconds = chunk.offset.and_then(|offset| transcript.time_at(offset));
            chunk
        })
        .collect()
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("recursive".parse::<SplitStrategy>().unwrap(), SplitStrategy::Recursive);
        assert_eq!("Window".parse::<SplitStrategy>().unwrap(), SplitStrategy::Window);
        assert!("semantic".parse::<SplitStrategy>().is_err());
    }

    #[test]
    fn test_chunk_transcript_attaches_timings() {
        let segments: Vec<TranscriptSegment> = (0..40)
            .map(|i| {
                TranscriptSegment::new(
                    i as f64 * 3.0,
                    (i + 1) as f64 * 3.0,
                    format!("segment number {} talks about topic {}", i, i % 5),
                )
            })
            .collect();
        let transcript = Transcript::new("vid", segments);

        let splitter = RecursiveSplitter::new(300, 60);
        let chunks = chunk_transcript(&splitter, &transcript);

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_seconds, Some(0.0));

        let mut previous = -1.0;
        for chunk in &chunks {
            let start = chunk.start_seconds.unwrap();
            assert!(start > previous);
            previous = start;

            let offset = chunk.offset.unwrap();
            assert!(transcript.text[offset..].starts_with(&chunk.text));
        }
    }

    #[test]
    fn test_strategies_are_interchangeable() {
        let text = "alpha beta gamma delta ".repeat(100);
        for strategy in [SplitStrategy::Recursive, SplitStrategy::Window] {
            let splitter = create_splitter(strategy, 200, 40);
            let chunks = splitter.split(&text);
            assert!(chunks.len() > 1, "{:?}", strategy);
            assert!(chunks.iter().all(|c| !c.text.trim().is_empty() && c.char_len() <= 200));
        }
    }
}
