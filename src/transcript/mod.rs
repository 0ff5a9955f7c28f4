//! Transcript acquisition.
//!
//! A [`TranscriptSource`] fetches the timed caption segments for a video and
//! joins them into one contiguous text for chunking. Segment timings are kept
//! alongside the text so chunks can be mapped back to a position in the video.

mod youtube;

pub use youtube::YoutubeTranscriptSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript of `video_id` in `language`.
    ///
    /// Fails with `TranscriptUnavailable` when the video has no transcript in
    /// that language or transcripts are disabled.
    async fn fetch(&self, video_id: &str, language: &str) -> Result<Transcript>;
}

/// A single caption segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// A complete transcript: segments plus their space-joined text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Individual segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Segment texts joined with single spaces.
    pub text: String,
    /// Byte offset in `text` where each segment starts.
    segment_starts: Vec<usize>,
}

impl Transcript {
    /// Create a transcript from segments. Blank segments are dropped.
    pub fn new(video_id: impl Into<String>, segments: Vec<TranscriptSegment>) -> Self {
        let segments: Vec<TranscriptSegment> = segments
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();

        let mut text = String::new();
        let mut segment_starts = Vec::with_capacity(segments.len());
        for segment in &segments {
            if !text.is_empty() {
                text.push(' ');
            }
            segment_starts.push(text.len());
            text.push_str(&segment.text);
        }

        Self {
            video_id: video_id.into(),
            segments,
            text,
            segment_starts,
        }
    }

    /// Whether the transcript has no text at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Start time of the segment containing byte `offset` of [`Transcript::text`].
    pub fn time_at(&self, offset: usize) -> Option<f64> {
        let idx = self.segment_starts.partition_point(|&start| start <= offset);
        idx.checked_sub(1).map(|i| self.segments[i].start_seconds)
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end_seconds).unwrap_or(0.0)
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
