//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// Backend failures are surfaced to the caller as-is; retry policy belongs
/// to the backend, never to the core pipeline.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend unavailable or returned a failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Query could not be executed
    #[error("Query error: {0}")]
    Query(String),

    /// The caller-supplied deadline passed before the call completed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
