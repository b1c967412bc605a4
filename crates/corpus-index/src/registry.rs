//! Process-wide index registry.
//!
//! A global mapping from index name to a registered index handle, populated
//! at process startup and read-only thereafter. Registration and lookup are
//! explicit calls; nothing registers itself as a side effect.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::IndexError;
use crate::index::{BuildStats, VectorIndex};

/// Object-safe operations every registered index exposes, independent of
/// its object type. Enough to rebuild or clear all indexes in one sweep.
pub trait IndexHandle: Send + Sync {
    fn name(&self) -> &str;
    fn build(&self) -> Result<BuildStats, IndexError>;
    fn clear(&self) -> Result<(), IndexError>;
}

impl<T> IndexHandle for VectorIndex<T> {
    fn name(&self) -> &str {
        VectorIndex::name(self)
    }

    fn build(&self) -> Result<BuildStats, IndexError> {
        VectorIndex::build(self)
    }

    fn clear(&self) -> Result<(), IndexError> {
        VectorIndex::clear(self)
    }
}

/// Registry mapping index names to handles.
pub struct IndexRegistry {
    indexes: RwLock<HashMap<String, Arc<dyn IndexHandle>>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static IndexRegistry {
        static GLOBAL: OnceLock<IndexRegistry> = OnceLock::new();
        GLOBAL.get_or_init(IndexRegistry::new)
    }

    /// Register an index under its name.
    ///
    /// Registering the same name again replaces the previous handle.
    pub fn register(&self, index: Arc<dyn IndexHandle>) {
        let mut indexes = self.indexes.write().unwrap();
        indexes.insert(index.name().to_string(), index);
    }

    /// Look up an index by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn IndexHandle>> {
        self.indexes.read().unwrap().get(name).cloned()
    }

    /// Registered index names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.indexes.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}
