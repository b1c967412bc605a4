//! Content-addressed embedding cache.
//!
//! Sits between document ingestion and embedding generation to avoid paying
//! for duplicate content. Keys combine a blake3 hash of the text with the
//! wrapped transformer's id, so identical text maps to the same entry while
//! differently-configured transformers never collide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use corpus_types::{Document, EmbeddedDocument};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingTransformer};

/// Cache key: content hash scoped by transformer id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// blake3 hex digest of the text content
    pub content_hash: String,
    /// Id of the transformer the vector came from
    pub transformer_id: String,
}

impl CacheKey {
    /// Derive the key for a piece of content under a given transformer.
    pub fn for_content(content: &str, transformer_id: &str) -> Self {
        Self {
            content_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
            transformer_id: transformer_id.to_string(),
        }
    }
}

/// Storage backend for cached embeddings.
pub trait EmbeddingCacheBackend: Send + Sync {
    /// Look up a cached embedding.
    fn get(&self, key: &CacheKey) -> Option<Embedding>;

    /// Store an embedding.
    fn put(&self, key: CacheKey, embedding: Embedding);

    /// Look up many keys at once. Missing keys are absent from the result.
    fn get_batch(&self, keys: &[CacheKey]) -> HashMap<CacheKey, Embedding> {
        keys.iter()
            .filter_map(|key| self.get(key).map(|embedding| (key.clone(), embedding)))
            .collect()
    }

    /// Store many entries at once.
    fn put_batch(&self, entries: Vec<(CacheKey, Embedding)>) {
        for (key, embedding) in entries {
            self.put(key, embedding);
        }
    }

    /// Drop all cached embeddings.
    fn clear(&self);
}

/// In-memory cache backend.
#[derive(Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, Embedding>>,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EmbeddingCacheBackend for MemoryCacheBackend {
    fn get(&self, key: &CacheKey) -> Option<Embedding> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: CacheKey, embedding: Embedding) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, embedding);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Caching wrapper around another embedding transformer.
///
/// Cache lookups are keyed by the wrapped transformer's id, so swapping the
/// base transformer naturally invalidates old entries.
pub struct CachedEmbedder {
    base: Arc<dyn EmbeddingTransformer>,
    backend: Arc<dyn EmbeddingCacheBackend>,
    cache_hits: AtomicU64,
}

impl CachedEmbedder {
    pub fn new(
        base: Arc<dyn EmbeddingTransformer>,
        backend: Arc<dyn EmbeddingCacheBackend>,
    ) -> Self {
        Self {
            base,
            backend,
            cache_hits: AtomicU64::new(0),
        }
    }

    /// Number of cache hits since construction.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    fn key_for(&self, content: &str) -> CacheKey {
        CacheKey::for_content(content, &self.base.transformer_id())
    }
}

impl EmbeddingTransformer for CachedEmbedder {
    fn transformer_id(&self) -> String {
        format!("cached:{}", self.base.transformer_id())
    }

    fn embed_string(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let key = self.key_for(text);

        if let Some(embedding) = self.backend.get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(embedding);
        }

        let embedding = self.base.embed_string(text)?;
        self.backend.put(key, embedding.clone());
        Ok(embedding)
    }

    fn embed_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<EmbeddedDocument>, EmbeddingError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<CacheKey> = documents
            .iter()
            .map(|document| self.key_for(&document.content))
            .collect();
        let cached = self.backend.get_batch(&keys);

        let mut results: Vec<Option<EmbeddedDocument>> = vec![None; documents.len()];
        let mut misses: Vec<Document> = Vec::new();
        let mut miss_indices: Vec<usize> = Vec::new();

        for (i, (document, key)) in documents.into_iter().zip(&keys).enumerate() {
            if let Some(embedding) = cached.get(key) {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %document.key, "Embedding cache hit");
                results[i] = Some(document.with_embedding(embedding.values.clone()));
            } else {
                debug!(key = %document.key, "Embedding cache miss");
                misses.push(document);
                miss_indices.push(i);
            }
        }

        if !misses.is_empty() {
            let embedded = self.base.embed_documents(misses)?;
            if embedded.len() != miss_indices.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: miss_indices.len(),
                    actual: embedded.len(),
                });
            }

            let entries: Vec<(CacheKey, Embedding)> = embedded
                .iter()
                .map(|document| {
                    (
                        self.key_for(&document.document.content),
                        Embedding::from_normalized(document.vector.clone()),
                    )
                })
                .collect();
            self.backend.put_batch(entries);

            for (i, document) in miss_indices.into_iter().zip(embedded) {
                results[i] = Some(document);
            }
        }

        // Every slot was filled from either the cache or the base transformer.
        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use corpus_types::{DocumentKey, Metadata, SourceKey};

    use super::*;

    /// Base transformer that counts how many strings it actually embeds.
    struct CountingEmbedder {
        id: String,
        calls: Mutex<Vec<String>>,
    }

    impl CountingEmbedder {
        fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl EmbeddingTransformer for CountingEmbedder {
        fn transformer_id(&self) -> String {
            self.id.clone()
        }

        fn embed_string(&self, text: &str) -> Result<Embedding, EmbeddingError> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(Embedding::new(vec![text.len() as f32, 1.0]))
        }
    }

    fn doc(id: &str, content: &str) -> Document {
        Document::new(
            DocumentKey::new(SourceKey::new("s", id), 0),
            content,
            Metadata::new(),
        )
    }

    #[test]
    fn test_same_text_embedded_once() {
        let base = Arc::new(CountingEmbedder::new("base"));
        let cached = CachedEmbedder::new(base.clone(), Arc::new(MemoryCacheBackend::new()));

        let first = cached.embed_string("hello").unwrap();
        let second = cached.embed_string("hello").unwrap();

        assert_eq!(first, second);
        assert_eq!(base.call_count(), 1);
        assert_eq!(cached.cache_hits(), 1);
    }

    #[test]
    fn test_batch_mixes_hits_and_misses_in_order() {
        let base = Arc::new(CountingEmbedder::new("base"));
        let cached = CachedEmbedder::new(base.clone(), Arc::new(MemoryCacheBackend::new()));

        // Warm the cache for "beta" only.
        cached.embed_string("beta").unwrap();
        assert_eq!(base.call_count(), 1);

        let documents = vec![doc("1", "alpha"), doc("2", "beta"), doc("3", "gamma")];
        let embedded = cached.embed_documents(documents.clone()).unwrap();

        assert_eq!(embedded.len(), 3);
        for (embedded, document) in embedded.iter().zip(&documents) {
            assert_eq!(embedded.key(), &document.key);
        }
        // Only alpha and gamma hit the base transformer.
        assert_eq!(base.call_count(), 3);
        assert_eq!(cached.cache_hits(), 1);
    }

    #[test]
    fn test_transformer_ids_do_not_collide() {
        let backend = Arc::new(MemoryCacheBackend::new());

        let a = CachedEmbedder::new(Arc::new(CountingEmbedder::new("model-a")), backend.clone());
        let b_base = Arc::new(CountingEmbedder::new("model-b"));
        let b = CachedEmbedder::new(b_base.clone(), backend.clone());

        a.embed_string("shared text").unwrap();
        // Same backend, same text, different transformer: must not hit.
        b.embed_string("shared text").unwrap();

        assert_eq!(b_base.call_count(), 1);
        assert_eq!(b.cache_hits(), 0);
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_cache_key_is_content_addressed() {
        let a = CacheKey::for_content("same", "t");
        let b = CacheKey::for_content("same", "t");
        let c = CacheKey::for_content("different", "t");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_clear_forgets_entries() {
        let backend = MemoryCacheBackend::new();
        backend.put(
            CacheKey::for_content("x", "t"),
            Embedding::new(vec![1.0, 0.0]),
        );
        assert_eq!(backend.len(), 1);
        backend.clear();
        assert!(backend.is_empty());
    }
}
