//! # corpus-storage
//!
//! Storage provider abstraction for the corpus indexing pipeline.
//!
//! A storage provider persists embedded documents and executes
//! nearest-neighbor queries. Concrete vector databases (pgvector, managed
//! vector buckets, ...) live behind the [`StorageProvider`] capability trait;
//! this crate ships the trait plus an in-memory cosine-similarity backend for
//! tests and development.

pub mod error;
pub mod memory;
pub mod provider;

pub use error::StorageError;
pub use memory::MemoryProvider;
pub use provider::{ScoredDocument, StorageProvider};
