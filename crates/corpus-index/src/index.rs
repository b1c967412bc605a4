//! Vector index: named composition of sources, embedder, and storage.

use std::sync::Arc;

use tracing::{info, warn};

use corpus_embeddings::EmbeddingTransformer;
use corpus_storage::StorageProvider;
use corpus_types::Document;

use crate::error::{IndexError, QueryError};
use crate::query::{DocumentResults, SearchOptions, SourceResults};
use crate::source::ObjectSource;

/// Statistics from an index build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of sources consulted
    pub sources: usize,
    /// Number of documents produced by sources
    pub documents: usize,
    /// Number of documents embedded and stored
    pub embedded: usize,
}

/// A named vector indexing pipeline over objects of type `T`.
///
/// Ingest runs source -> chunk -> embed -> store; query runs embed query ->
/// storage search -> result mapping. Queries execute synchronously within
/// the calling context; independent queries may run concurrently, but each
/// result set is owned by a single logical request.
pub struct VectorIndex<T> {
    name: String,
    sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
    embedder: Arc<dyn EmbeddingTransformer>,
    storage: Arc<dyn StorageProvider>,
}

impl<T> VectorIndex<T> {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<Arc<dyn ObjectSource<Object = T>>>,
        embedder: Arc<dyn EmbeddingTransformer>,
        storage: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            sources,
            embedder,
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build or rebuild the index from its configured sources.
    ///
    /// Gathers documents from every source, embeds them, and stores the
    /// result. Sources that produce nothing are a warning, not a failure.
    pub fn build(&self) -> Result<BuildStats, IndexError> {
        let mut stats = BuildStats {
            sources: self.sources.len(),
            ..BuildStats::default()
        };

        let mut documents: Vec<Document> = Vec::new();
        for source in &self.sources {
            info!(index = %self.name, source_id = %source.source_id(), "Collecting documents");
            documents.extend(source.documents()?);
        }
        stats.documents = documents.len();

        if documents.is_empty() {
            warn!(index = %self.name, "No documents produced by sources");
            return Ok(stats);
        }

        info!(index = %self.name, count = documents.len(), "Embedding documents");
        let embedded = self.embedder.embed_documents(documents)?;
        stats.embedded = embedded.len();

        info!(index = %self.name, count = embedded.len(), "Storing embedded documents");
        self.storage.add(embedded)?;

        Ok(stats)
    }

    /// Remove every stored document for this index.
    pub fn clear(&self) -> Result<(), IndexError> {
        self.storage.clear()?;
        Ok(())
    }

    /// Re-index one object after it changed.
    ///
    /// Stable keys make this an upsert: the object's chunks overwrite the
    /// previously stored ones in place.
    pub fn update_object(&self, object: &T) -> Result<(), IndexError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.provides_object(object));
        let Some(source) = source else {
            warn!(index = %self.name, "No source claims object; nothing to update");
            return Ok(());
        };

        let documents = source.documents_for_object(object)?;
        if documents.is_empty() {
            return Ok(());
        }
        let embedded = self.embedder.embed_documents(documents)?;
        self.storage.add(embedded)?;
        Ok(())
    }

    /// Remove the stored documents of one object.
    pub fn delete_object(&self, object: &T) -> Result<(), IndexError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.provides_object(object));
        let Some(source) = source else {
            warn!(index = %self.name, "No source claims object; nothing to delete");
            return Ok(());
        };

        let keys: Vec<_> = source
            .documents_for_object(object)?
            .into_iter()
            .map(|document| document.key)
            .collect();
        self.storage.delete(&keys)?;
        Ok(())
    }

    /// Document-level search with default options.
    pub fn search(&self, query: &str) -> Result<DocumentResults<T>, QueryError> {
        self.search_with_options(query, SearchOptions::default())
    }

    /// Document-level search.
    ///
    /// Embeds the query eagerly; the storage search itself stays lazy in
    /// the returned result set.
    pub fn search_with_options(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<DocumentResults<T>, QueryError> {
        options.validate()?;
        if query.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let embedding = self.embedder.embed_string(query)?;
        Ok(DocumentResults::new(
            self.storage.clone(),
            self.sources.clone(),
            embedding,
            options,
        ))
    }

    /// Source-level search: deduplicated ranked source objects.
    pub fn search_sources(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> Result<SourceResults<T>, QueryError> {
        Ok(self.search_with_options(query, options)?.to_sources())
    }

    /// Find documents similar to an already-indexed object.
    ///
    /// The object's first chunk stands in as the query. Fails when no
    /// configured source claims the object.
    pub fn find_similar(&self, object: &T) -> Result<DocumentResults<T>, QueryError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.provides_object(object))
            .ok_or_else(|| QueryError::NoSource(self.name.clone()))?;

        let documents = source.documents_for_object(object)?;
        let Some(first) = documents.first() else {
            return Err(QueryError::EmptyQuery);
        };

        let embedding = self.embedder.embed_string(&first.content)?;
        Ok(DocumentResults::new(
            self.storage.clone(),
            self.sources.clone(),
            embedding,
            SearchOptions::default(),
        ))
    }
}
