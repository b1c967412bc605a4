//! Lazy query result sets and overfetch resolution.
//!
//! Two views exist over one underlying search: the document view (raw ranked
//! chunks) and the source view (deduplicated ranked source objects). The
//! source view runs the overfetch-then-deduplicate loop: fetch more raw
//! documents than requested, collapse them by source object, and re-query
//! with a doubled fetch size while too few unique objects resolved.
//!
//! Result sets are lazy and single-owner: constructing one performs no
//! storage call; the first access to items or length executes the search
//! once and caches it for the lifetime of the instance.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use corpus_embeddings::Embedding;
use corpus_storage::{ScoredDocument, StorageProvider};
use corpus_types::{Document, SourceKey};

use crate::error::QueryError;
use crate::source::ObjectSource;

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 10;

/// Default ratio of raw documents fetched per requested source object.
pub const DEFAULT_OVERFETCH_MULTIPLIER: usize = 2;

/// Default number of fetch rounds before accepting a short result.
pub const DEFAULT_MAX_OVERFETCH_ITERATIONS: usize = 3;

/// Parameters controlling a search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum results to return
    pub limit: usize,
    /// First-round fetch size is `limit * overfetch_multiplier`
    pub overfetch_multiplier: usize,
    /// Fetch rounds allowed before returning an under-filled result
    pub max_overfetch_iterations: usize,
    /// Optional deadline threaded through every storage call
    pub deadline: Option<Instant>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            overfetch_multiplier: DEFAULT_OVERFETCH_MULTIPLIER,
            max_overfetch_iterations: DEFAULT_MAX_OVERFETCH_ITERATIONS,
            deadline: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_overfetch_multiplier(mut self, multiplier: usize) -> Self {
        self.overfetch_multiplier = multiplier;
        self
    }

    pub fn with_max_overfetch_iterations(mut self, iterations: usize) -> Self {
        self.max_overfetch_iterations = iterations;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validate at construction time; zero values are configuration errors.
    pub(crate) fn validate(&self) -> Result<(), QueryError> {
        if self.limit == 0 {
            return Err(QueryError::Config("limit must be at least 1".into()));
        }
        if self.overfetch_multiplier == 0 {
            return Err(QueryError::Config(
                "overfetch_multiplier must be at least 1".into(),
            ));
        }
        if self.max_overfetch_iterations == 0 {
            return Err(QueryError::Config(
                "max_overfetch_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A source object in a ranked result, with its best chunk score.
#[derive(Debug, Clone)]
pub struct ScoredObject<T> {
    /// Identity of the source object
    pub key: SourceKey,
    /// The resolved origin object
    pub object: T,
    /// Best similarity score among the object's chunks
    pub score: f32,
}

/// Lazy document-level view of a search.
pub struct DocumentResults<T> {
    storage: Arc<dyn StorageProvider>,
    sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
    embedding: Embedding,
    options: SearchOptions,
    cache: OnceCell<Vec<ScoredDocument>>,
}

impl<T> DocumentResults<T> {
    pub(crate) fn new(
        storage: Arc<dyn StorageProvider>,
        sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
        embedding: Embedding,
        options: SearchOptions,
    ) -> Self {
        Self {
            storage,
            sources,
            embedding,
            options,
            cache: OnceCell::new(),
        }
    }

    /// Ranked documents, materialized on first access.
    pub fn items(&self) -> Result<&[ScoredDocument], QueryError> {
        if let Some(items) = self.cache.get() {
            return Ok(items);
        }
        let fetched =
            self.storage
                .query(&self.embedding, self.options.limit, self.options.deadline)?;
        Ok(self.cache.get_or_init(|| fetched))
    }

    pub fn len(&self) -> Result<usize, QueryError> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueryError> {
        Ok(self.items()?.is_empty())
    }

    pub fn iter(&self) -> Result<std::slice::Iter<'_, ScoredDocument>, QueryError> {
        Ok(self.items()?.iter())
    }

    /// Convert to the deduplicated source-level view.
    ///
    /// Lossless direction: duplicates collapse to the highest-ranked
    /// occurrence. The conversion carries the query parameters, not the
    /// materialized documents, so the source view runs its own overfetch.
    pub fn to_sources(&self) -> SourceResults<T> {
        SourceResults::new(
            self.storage.clone(),
            self.sources.clone(),
            self.embedding.clone(),
            self.options.clone(),
        )
    }
}

/// Lazy source-level view of a search: deduplicated ranked source objects.
pub struct SourceResults<T> {
    storage: Arc<dyn StorageProvider>,
    sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
    embedding: Embedding,
    options: SearchOptions,
    cache: OnceCell<Vec<ScoredObject<T>>>,
}

impl<T> SourceResults<T> {
    pub(crate) fn new(
        storage: Arc<dyn StorageProvider>,
        sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
        embedding: Embedding,
        options: SearchOptions,
    ) -> Self {
        Self {
            storage,
            sources,
            embedding,
            options,
            cache: OnceCell::new(),
        }
    }

    /// Ranked unique source objects, materialized on first access.
    ///
    /// May return fewer than `limit` objects when the corpus does not hold
    /// enough unique sources within the iteration budget; under-fill is a
    /// valid terminal state, not an error.
    pub fn items(&self) -> Result<&[ScoredObject<T>], QueryError> {
        if let Some(items) = self.cache.get() {
            return Ok(items);
        }
        let resolved = self.execute()?;
        Ok(self.cache.get_or_init(|| resolved))
    }

    pub fn len(&self) -> Result<usize, QueryError> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueryError> {
        Ok(self.items()?.is_empty())
    }

    pub fn iter(&self) -> Result<std::slice::Iter<'_, ScoredObject<T>>, QueryError> {
        Ok(self.items()?.iter())
    }

    /// The resolved origin objects in rank order.
    pub fn objects(&self) -> Result<impl Iterator<Item = &T>, QueryError> {
        Ok(self.items()?.iter().map(|scored| &scored.object))
    }

    /// Convert back to the document-level view.
    ///
    /// The document view cannot be reconstructed from deduplicated objects,
    /// so this re-issues the document query with the same parameters.
    pub fn to_documents(&self) -> DocumentResults<T> {
        DocumentResults::new(
            self.storage.clone(),
            self.sources.clone(),
            self.embedding.clone(),
            self.options.clone(),
        )
    }

    /// The overfetch-then-deduplicate loop.
    ///
    /// Each round is a fresh bounded query, never a cursor continuation, so
    /// memory stays proportional to the current fetch size.
    fn execute(&self) -> Result<Vec<ScoredObject<T>>, QueryError> {
        let limit = self.options.limit;
        let mut fetch_size = limit.saturating_mul(self.options.overfetch_multiplier);
        let mut resolved = Vec::new();

        for round in 1..=self.options.max_overfetch_iterations {
            let hits = self
                .storage
                .query(&self.embedding, fetch_size, self.options.deadline)?;
            let exhausted = hits.len() < fetch_size;

            resolved = self.resolve_sources(&hits)?;

            if resolved.len() >= limit {
                debug!(round, unique = resolved.len(), "Overfetch satisfied");
                break;
            }
            if exhausted {
                // Storage has no more documents; a larger fetch cannot help.
                debug!(
                    round,
                    unique = resolved.len(),
                    limit,
                    "Storage exhausted; returning short result"
                );
                break;
            }
            if round == self.options.max_overfetch_iterations {
                debug!(
                    round,
                    unique = resolved.len(),
                    limit,
                    "Overfetch budget spent; returning short result"
                );
                break;
            }

            fetch_size = fetch_size.saturating_mul(2);
        }

        resolved.truncate(limit);
        Ok(resolved)
    }

    /// Collapse ranked document hits into unique resolved source objects.
    ///
    /// Hits arrive in descending score order, so the first occurrence of a
    /// source key carries its best score and rank. Keys whose object no
    /// longer resolves are logged and skipped.
    fn resolve_sources(&self, hits: &[ScoredDocument]) -> Result<Vec<ScoredObject<T>>, QueryError> {
        let mut order: Vec<SourceKey> = Vec::new();
        let mut best_score: HashMap<SourceKey, f32> = HashMap::new();
        let mut representatives: HashMap<String, Vec<Document>> = HashMap::new();

        for hit in hits {
            let key = hit.document.key.source.clone();
            if best_score.contains_key(&key) {
                continue;
            }
            best_score.insert(key.clone(), hit.score);
            representatives
                .entry(key.source_id.clone())
                .or_default()
                .push(hit.document.clone());
            order.push(key);
        }

        let mut objects: HashMap<SourceKey, T> = HashMap::new();
        for source in &self.sources {
            if let Some(documents) = representatives.remove(source.source_id()) {
                objects.extend(source.objects_from_documents(&documents)?);
            }
        }
        for (source_id, documents) in &representatives {
            warn!(
                source_id = %source_id,
                documents = documents.len(),
                "No configured source for stored documents; skipping"
            );
        }

        let mut output = Vec::with_capacity(order.len());
        for key in order {
            let score = best_score.get(&key).copied().unwrap_or(0.0);
            match objects.remove(&key) {
                Some(object) => output.push(ScoredObject { key, object, score }),
                None => {
                    warn!(key = %key, "Source object no longer resolves; skipping");
                }
            }
        }
        Ok(output)
    }
}
