//! Boundary-aware windowing chunker.

use crate::error::ChunkingError;
use crate::{validate_config, ChunkTransformer};

/// Splits text into windows that prefer breaking at natural boundaries.
///
/// Within each window the chunker looks, in order of preference, for a
/// paragraph break (`\n\n`), a line break, then a sentence end (`. `, `! `,
/// `? `). When no boundary exists in the window it falls back to a hard cut
/// at the window edge, so no window ever exceeds `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a chunker with the given maximum window size and overlap.
    ///
    /// Fails with [`ChunkingError::Config`] unless `chunk_size >= 1` and
    /// `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        validate_config(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Find the best cut position in `(start, hard_end]`, or `None` for a
    /// hard cut. Cuts land just after the boundary delimiter. The lower
    /// bound keeps the next window's start strictly advancing.
    fn find_break(&self, chars: &[char], start: usize, hard_end: usize) -> Option<usize> {
        let floor = start + self.chunk_overlap + 1;

        for j in (floor..=hard_end).rev() {
            if j >= 2 && chars[j - 1] == '\n' && chars[j - 2] == '\n' {
                return Some(j);
            }
        }
        for j in (floor..=hard_end).rev() {
            if chars[j - 1] == '\n' {
                return Some(j);
            }
        }
        for j in (floor..=hard_end).rev() {
            if j >= 2 && chars[j - 1] == ' ' && matches!(chars[j - 2], '.' | '!' | '?') {
                return Some(j);
            }
        }
        None
    }
}

impl ChunkTransformer for BoundaryChunker {
    fn transform(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();

        if chars.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let hard_end = (start + self.chunk_size).min(chars.len());
            let end = if hard_end == chars.len() {
                hard_end
            } else {
                self.find_break(&chars, start, hard_end).unwrap_or(hard_end)
            };
            chunks.push(chars[start..end].iter().collect());

            if end >= chars.len() {
                break;
            }
            start = end - self.chunk_overlap;
        }

        chunks
    }

    fn overlap(&self) -> usize {
        self.chunk_overlap
    }
}
