//! Recursive boundary-aware splitter.
//!
//! Tries the coarsest separator present in the text first (paragraph, line,
//! sentence, word) and only falls back to finer ones for pieces that are still
//! too long. Adjacent pieces are then merged greedily up to `chunk_size`
//! characters, carrying up to `chunk_overlap` characters of trailing pieces
//! into the next chunk.

use super::{char_len, TextSplitter, TranscriptChunk};
use std::collections::VecDeque;

/// Separators in priority order. The empty separator splits into characters.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Recursive character splitter.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// A slice of the source text and its byte offset in it.
#[derive(Debug, Clone, Copy)]
struct Piece<'a> {
    start: usize,
    text: &'a str,
}

impl RecursiveSplitter {
    /// Create a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    fn split_recursive<'a>(&self, piece: Piece<'a>, separators: &[&str], out: &mut Vec<TranscriptChunk>) {
        // The list always ends with "", so a separator is always found and
        // the character split is the last resort for oversized pieces.
        let (separator, finer) = match separators
            .iter()
            .position(|s| s.is_empty() || piece.text.contains(s))
        {
            Some(i) if !separators[i].is_empty() => (separators[i], &separators[i + 1..]),
            _ => ("", &separators[..0]),
        };

        let mut fitting: Vec<Piece<'a>> = Vec::new();

        for split in split_keeping_separator(piece, separator) {
            if char_len(split.text) < self.chunk_size {
                fitting.push(split);
                continue;
            }

            if !fitting.is_empty() {
                self.merge(&fitting, out);
                fitting.clear();
            }

            if finer.is_empty() {
                push_trimmed(&[split], out);
            } else {
                self.split_recursive(split, finer, out);
            }
        }

        if !fitting.is_empty() {
            self.merge(&fitting, out);
        }
    }

    /// Greedily merge pieces into chunks of at most `chunk_size` characters.
    fn merge(&self, pieces: &[Piece<'_>], out: &mut Vec<TranscriptChunk>) {
        let mut current: VecDeque<Piece<'_>> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece.text);

            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(current.make_contiguous(), out);

                // Keep a tail of at most `chunk_overlap` characters that still
                // leaves room for the incoming piece.
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match current.pop_front() {
                        Some(dropped) => total -= char_len(dropped.text),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_trimmed(current.make_contiguous(), out);
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextSplitter for RecursiveSplitter {
    fn split(&self, text: &str) -> Vec<TranscriptChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if char_len(text) <= self.chunk_size {
            return vec![TranscriptChunk::new(text).with_offset(0)];
        }

        let mut chunks = Vec::new();
        self.split_recursive(Piece { start: 0, text }, &DEFAULT_SEPARATORS, &mut chunks);
        chunks
    }
}

/// Split on `separator`, leaving it attached to the end of each piece.
fn split_keeping_separator<'a>(piece: Piece<'a>, separator: &str) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut start = piece.start;

    if separator.is_empty() {
        for (i, c) in piece.text.char_indices() {
            pieces.push(Piece {
                start: piece.start + i,
                text: &piece.text[i..i + c.len_utf8()],
            });
        }
        return pieces;
    }

    for text in piece.text.split_inclusive(separator) {
        if !text.is_empty() {
            pieces.push(Piece { start, text });
        }
        start += text.len();
    }
    pieces
}

/// Join consecutive pieces, trim, and emit the result if anything is left.
fn push_trimmed(pieces: &[Piece<'_>], out: &mut Vec<TranscriptChunk>) {
    let Some(first) = pieces.first() else {
        return;
    };

    let joined: String = pieces.iter().map(|p| p.text).collect();
    let leading = joined.len() - joined.trim_start().len();
    let trimmed = joined.trim();

    if !trimmed.is_empty() {
        out.push(TranscriptChunk::new(trimmed).with_offset(first.start + leading));
    }
}
