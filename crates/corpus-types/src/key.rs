//! Stable keys for source objects and document chunks.
//!
//! A `DocumentKey` renders as `source_id:object_key:chunk`. The format is
//! stable across index rebuilds: the same source object at the same chunk
//! position always produces the same key, which keeps re-indexing idempotent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a key from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    /// Key did not have the expected number of segments
    #[error("Malformed key '{0}': expected source_id:object_key:chunk")]
    Malformed(String),

    /// Chunk suffix was not a number
    #[error("Invalid chunk position in key '{0}'")]
    InvalidChunk(String),
}

/// Identifies one source object: the domain entity a document was derived from.
///
/// Many documents may share one `SourceKey` (one chunk each); deduplicating
/// query results by this key is what turns a document-level ranking into a
/// source-level one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    /// Identifier of the source that produced the object's documents
    pub source_id: String,
    /// Source-specific key of the object (e.g. a record primary key)
    pub object_key: String,
}

impl SourceKey {
    pub fn new(source_id: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            object_key: object_key.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.object_key)
    }
}

/// Identity key of a single document chunk.
///
/// Unique per chunk; the `source` part namespaces the key to the producing
/// source and identifies the original object for reverse mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// The source object this chunk was derived from
    pub source: SourceKey,
    /// Zero-based chunk position within the object's content
    pub chunk: u32,
}

impl DocumentKey {
    pub fn new(source: SourceKey, chunk: u32) -> Self {
        Self { source, chunk }
    }

    /// The source namespace prefix of this key.
    pub fn source_id(&self) -> &str {
        &self.source.source_id
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.chunk)
    }
}

impl FromStr for DocumentKey {
    type Err = KeyParseError;

    /// Parses `source_id:object_key:chunk`. Object keys may themselves
    /// contain `:`; the first segment is the source id and the last is the
    /// chunk position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, chunk) = s
            .rsplit_once(':')
            .ok_or_else(|| KeyParseError::Malformed(s.to_string()))?;
        let (source_id, object_key) = head
            .split_once(':')
            .ok_or_else(|| KeyParseError::Malformed(s.to_string()))?;
        if source_id.is_empty() || object_key.is_empty() {
            return Err(KeyParseError::Malformed(s.to_string()));
        }
        let chunk: u32 = chunk
            .parse()
            .map_err(|_| KeyParseError::InvalidChunk(s.to_string()))?;
        Ok(DocumentKey::new(SourceKey::new(source_id, object_key), chunk))
    }
}
