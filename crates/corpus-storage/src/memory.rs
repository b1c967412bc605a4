//! In-memory storage provider.
//!
//! Brute-force cosine similarity over an insertion-ordered document list.
//! Intended for tests and development; real deployments put a vector
//! database behind [`StorageProvider`].

use std::sync::RwLock;
use std::time::Instant;

use tracing::debug;

use corpus_embeddings::Embedding;
use corpus_types::{DocumentKey, EmbeddedDocument};

use crate::error::StorageError;
use crate::provider::{ScoredDocument, StorageProvider};

/// In-memory vector store.
#[derive(Default)]
pub struct MemoryProvider {
    // Insertion order is preserved so equal-score results rank stably.
    documents: RwLock<Vec<EmbeddedDocument>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<EmbeddedDocument>>, StorageError> {
        self.documents
            .read()
            .map_err(|e| StorageError::Backend(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<EmbeddedDocument>>, StorageError> {
        self.documents
            .write()
            .map_err(|e| StorageError::Backend(format!("Failed to acquire write lock: {}", e)))
    }
}

fn cosine(query: &Embedding, vector: &[f32]) -> f32 {
    if query.values.len() != vector.len() {
        return 0.0;
    }
    let dot: f32 = query.values.iter().zip(vector).map(|(a, b)| a * b).sum();
    let query_norm: f32 = query.values.iter().map(|x| x * x).sum::<f32>().sqrt();
    let vector_norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if query_norm == 0.0 || vector_norm == 0.0 {
        return 0.0;
    }
    dot / (query_norm * vector_norm)
}

impl StorageProvider for MemoryProvider {
    fn add(&self, documents: Vec<EmbeddedDocument>) -> Result<(), StorageError> {
        let mut stored = self.write()?;
        for document in documents {
            match stored.iter().position(|d| d.key() == document.key()) {
                // Upsert keeps the original insertion position.
                Some(pos) => stored[pos] = document,
                None => stored.push(document),
            }
        }
        Ok(())
    }

    fn delete(&self, keys: &[DocumentKey]) -> Result<(), StorageError> {
        let mut stored = self.write()?;
        stored.retain(|document| !keys.contains(document.key()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.write()?.clear();
        Ok(())
    }

    fn query(
        &self,
        vector: &Embedding,
        limit: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(StorageError::DeadlineExceeded);
            }
        }

        let stored = self.read()?;
        let mut scored: Vec<ScoredDocument> = stored
            .iter()
            .map(|document| {
                ScoredDocument::new(document.document.clone(), cosine(vector, &document.vector))
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);

        debug!(returned = scored.len(), limit = limit, "Memory store query");
        Ok(scored)
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }
}
