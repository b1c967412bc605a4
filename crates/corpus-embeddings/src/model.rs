//! Embedding value type and transformer trait.

use corpus_types::{Document, EmbeddedDocument};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Vector embedding - a normalized float array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The embedding vector (normalized to unit length)
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Create embedding without normalization (for pre-normalized vectors)
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Compute cosine similarity with another embedding.
    /// Returns value in [-1, 1] range (1 = identical).
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        // Since both are normalized, dot product = cosine similarity
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Trait for embedding transformers.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
pub trait EmbeddingTransformer: Send + Sync {
    /// Identifier that distinguishes this transformer configuration.
    ///
    /// Used to scope embedding cache keys: two transformers that would
    /// produce different vectors for the same text must report different
    /// ids.
    fn transformer_id(&self) -> String;

    /// Generate an embedding for a single string.
    fn embed_string(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Attach embeddings to documents, preserving input order and count.
    ///
    /// Default implementation embeds one document at a time; transformers
    /// with a batch API should override.
    fn embed_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<EmbeddedDocument>, EmbeddingError> {
        documents
            .into_iter()
            .map(|document| {
                let embedding = self.embed_string(&document.content)?;
                Ok(document.with_embedding(embedding.values))
            })
            .collect()
    }
}
