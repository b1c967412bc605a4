//! Storage provider trait and query result types.

use std::time::Instant;

use corpus_embeddings::Embedding;
use corpus_types::{Document, DocumentKey, EmbeddedDocument};

use crate::error::StorageError;

/// A document returned from a nearest-neighbor query with its similarity
/// score. Higher scores are more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.document.key
    }
}

/// Trait for vector storage backends.
///
/// Implementations must be thread-safe; concurrent `add` calls for disjoint
/// key sets must not corrupt state.
pub trait StorageProvider: Send + Sync {
    /// Persist embedded documents, upserting by document key.
    fn add(&self, documents: Vec<EmbeddedDocument>) -> Result<(), StorageError>;

    /// Delete documents by key. Deleting a missing key is a no-op.
    fn delete(&self, keys: &[DocumentKey]) -> Result<(), StorageError>;

    /// Remove every document from the store.
    fn clear(&self) -> Result<(), StorageError>;

    /// Nearest-neighbor query.
    ///
    /// Returns up to `limit` documents ordered by descending similarity,
    /// ties broken by insertion order (stable). A provider checks `deadline`
    /// and returns [`StorageError::DeadlineExceeded`] once it has passed.
    fn query(
        &self,
        vector: &Embedding,
        limit: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredDocument>, StorageError>;

    /// Number of stored documents.
    fn len(&self) -> Result<usize, StorageError>;

    /// Whether the store is empty.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}
