//! # corpus-embeddings
//!
//! Embedding transformers for the corpus indexing pipeline.
//!
//! An embedding transformer attaches vectors to documents; the numeric work
//! is delegated to an external embedding API. This crate provides:
//! - The `Embedding` value type (unit-normalized float vector)
//! - The `EmbeddingTransformer` trait
//! - `ApiEmbedder`: OpenAI-compatible HTTP embeddings endpoint client
//! - `CachedEmbedder`: content-addressed caching wrapper around any
//!   transformer, keyed by `(blake3(content), transformer_id)`

pub mod api;
pub mod cache;
pub mod error;
pub mod model;

pub use api::{ApiEmbedder, ApiEmbedderConfig};
pub use cache::{CacheKey, CachedEmbedder, EmbeddingCacheBackend, MemoryCacheBackend};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingTransformer};
