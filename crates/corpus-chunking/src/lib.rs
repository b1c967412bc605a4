//! # corpus-chunking
//!
//! Deterministic text chunking for the corpus indexing pipeline.
//!
//! A chunk transformer splits raw text into an ordered sequence of substrings
//! under size/overlap rules. Transformers are pure: no I/O, no side effects,
//! and the same input always yields the same chunks.
//!
//! Invariant shared by all transformers: concatenating the chunks while
//! skipping the declared overlap reconstructs the input exactly, so no
//! character is ever dropped.

pub mod boundary;
pub mod error;
pub mod window;

pub use boundary::BoundaryChunker;
pub use error::ChunkingError;
pub use window::WindowChunker;

/// Splits a string into an ordered sequence of chunks.
///
/// Implementations must be deterministic and pure. Size and overlap
/// parameters are validated at construction time, never at call time.
pub trait ChunkTransformer: Send + Sync {
    /// Split `text` into ordered chunks.
    fn transform(&self, text: &str) -> Vec<String>;

    /// Number of characters shared between consecutive chunks.
    fn overlap(&self) -> usize;
}

pub(crate) fn validate_config(chunk_size: usize, chunk_overlap: usize) -> Result<(), ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::Config(
            "chunk_size must be a positive integer".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(ChunkingError::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}
