//! Fixed-width windowing chunker.

use crate::error::ChunkingError;
use crate::{validate_config, ChunkTransformer};

/// Default window width in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap carried between consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Splits text into fixed-width character windows with overlap.
///
/// Windows are measured in characters, not bytes, so multi-byte text is
/// never cut mid-codepoint. Text no longer than one window yields a single
/// chunk.
#[derive(Debug, Clone)]
pub struct WindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowChunker {
    /// Create a chunker with the given window size and overlap.
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

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkTransformer for WindowChunker {
    fn transform(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();

        if chars.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());

            if end >= chars.len() {
                break;
            }
            // Each new window re-reads the overlap tail of the previous one.
            start = end - self.chunk_overlap;
        }

        chunks
    }

    fn overlap(&self) -> usize {
        self.chunk_overlap
    }
}
