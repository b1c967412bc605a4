//! # corpus-index
//!
//! Vector index composition and query resolution for the corpus pipeline.
//!
//! A [`VectorIndex`] wires sources, an embedding transformer, and a storage
//! provider into a named pipeline: ingest (source -> chunk -> embed -> store)
//! and query (embed query -> storage search -> result mapping).
//!
//! The query side exposes two views over the same underlying search:
//! - [`DocumentResults`]: raw ranked document chunks
//! - [`SourceResults`]: deduplicated ranked source objects, produced by the
//!   overfetch-then-deduplicate algorithm in [`query`]
//!
//! Both views are lazy: no storage call happens until results are requested,
//! and results materialize exactly once per result set instance.

pub mod error;
pub mod index;
pub mod query;
pub mod registry;
pub mod source;

pub use error::{IndexError, QueryError, SourceError};
pub use index::{BuildStats, VectorIndex};
pub use query::{
    DocumentResults, ScoredObject, SearchOptions, SourceResults, DEFAULT_LIMIT,
    DEFAULT_MAX_OVERFETCH_ITERATIONS, DEFAULT_OVERFETCH_MULTIPLIER,
};
pub use registry::{IndexHandle, IndexRegistry};
pub use source::{ObjectSource, RecordSource, RecordStore, Source};
