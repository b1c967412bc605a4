//! # corpus-types
//!
//! Shared schema types for the corpus vector indexing pipeline.
//!
//! This crate defines the data structures that flow between sources,
//! embedding transformers, and storage providers:
//! - Keys: stable, namespaced identifiers for source objects and chunks
//! - Documents: chunks of source text plus metadata, ready for embedding
//! - Embedded documents: documents paired with their vector

pub mod document;
pub mod key;

pub use document::{Document, EmbeddedDocument, Metadata};
pub use key::{DocumentKey, KeyParseError, SourceKey};
