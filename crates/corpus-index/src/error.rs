//! Index and query error types.

use thiserror::Error;

use corpus_embeddings::EmbeddingError;
use corpus_storage::StorageError;

/// Errors from sources producing or reverse-mapping documents.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The object does not belong to this source
    #[error("Object does not belong to source '{0}'")]
    ForeignObject(String),

    /// Failure enumerating or fetching origin records
    #[error("Failed to fetch from source: {0}")]
    Fetch(String),
}

/// Errors from query execution.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Invalid search options
    #[error("Configuration error: {0}")]
    Config(String),

    /// The query string was empty
    #[error("Search query cannot be empty")]
    EmptyQuery,

    /// No configured source claims the query object
    #[error("No suitable source found for query object on index '{0}'")]
    NoSource(String),

    /// Embedding the query failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// The storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A source failed while mapping documents back to objects
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors from index build/maintenance operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A source failed to produce documents
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Embedding documents failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// The storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}
