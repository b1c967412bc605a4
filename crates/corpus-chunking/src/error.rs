//! Chunking error types.

use thiserror::Error;

/// Errors from chunk transformer construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Invalid size/overlap parameters
    #[error("Invalid chunking configuration: {0}")]
    Config(String),
}
