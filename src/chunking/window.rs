//! Fixed-size character windows.
//!
//! Ignores text structure entirely: every chunk is `chunk_size` characters and
//! starts `chunk_size - chunk_overlap` characters after the previous one.

use super::{char_len, TextSplitter, TranscriptChunk};

/// Sliding character-window splitter.
#[derive(Debug, Clone)]
pub struct WindowSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowSplitter {
    /// Create a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }
}

impl TextSplitter for WindowSplitter {
    fn split(&self, text: &str) -> Vec<TranscriptChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let total = char_len(text);
        if total <= self.chunk_size {
            return vec![TranscriptChunk::new(text).with_offset(0)];
        }

        // Byte offset of every character, plus the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total);
            let slice = &text[boundaries[start]..boundaries[end]];
            if !slice.trim().is_empty() {
                chunks.push(TranscriptChunk::new(slice).with_offset(boundaries[start]));
            }
            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_overlap_exactly() {
        let splitter = WindowSplitter::new(10, 4);
        let text = "0123456789abcdefghij";
        let chunks = splitter.split(text);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["0123456789", "6789abcdef", "cdefghij"]);
        assert_eq!(chunks[1].offset, Some(6));
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = WindowSplitter::new(100, 10);
        let chunks = splitter.split("short");
        assert_eq!(chunks, vec![TranscriptChunk::new("short").with_offset(0)]);
    }

    #[test]
    fn test_skips_blank_windows() {
        let splitter = WindowSplitter::new(4, 0);
        let text = format!("abcd{}efgh", " ".repeat(8));
        let chunks = splitter.split(&text);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh"]);
    }
}
