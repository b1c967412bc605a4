//! Document schema.
//!
//! A `Document` is one chunk of source text with metadata and a stable key.
//! An `EmbeddedDocument` is a document paired with its vector; it is the form
//! that gets persisted by a storage provider and is never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::DocumentKey;

/// Arbitrary metadata attached to a document.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A chunk of source text ready for embedding.
///
/// Created by a source during ingestion; immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identity key, unique per chunk
    pub key: DocumentKey,
    /// The chunk's text payload
    pub content: String,
    /// Arbitrary metadata mapping
    pub metadata: Metadata,
}

impl Document {
    pub fn new(key: DocumentKey, content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            key,
            content: content.into(),
            metadata,
        }
    }

    /// Pair this document with an embedding vector.
    pub fn with_embedding(self, vector: Vec<f32>) -> EmbeddedDocument {
        EmbeddedDocument {
            document: self,
            vector,
        }
    }
}

/// A document plus its fixed-length embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    /// The underlying document
    pub document: Document,
    /// The embedding vector
    pub vector: Vec<f32>,
}

impl EmbeddedDocument {
    /// Identity key of the underlying document.
    pub fn key(&self) -> &DocumentKey {
        &self.document.key
    }
}
