//! Sources: producers of documents with reverse mapping to origin objects.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use corpus_chunking::ChunkTransformer;
use corpus_types::{Document, DocumentKey, Metadata, SourceKey};

use crate::error::SourceError;

/// Produces documents from some origin (records, files, API payloads).
///
/// A source owns a key namespace: every document it produces carries its
/// `source_id` as the key prefix, and `provides_document` answers by that
/// prefix alone.
pub trait Source: Send + Sync {
    /// The domain object documents are derived from.
    type Object;

    /// Stable identifier, used as the namespace prefix for document keys.
    fn source_id(&self) -> &str;

    /// Produce all documents from this source. Finite; may perform I/O.
    fn documents(&self) -> Result<Vec<Document>, SourceError>;

    /// Whether the document key belongs to this source's namespace.
    fn provides_document(&self, key: &DocumentKey) -> bool {
        key.source_id() == self.source_id()
    }
}

/// A source that can map documents back to its origin objects.
pub trait ObjectSource: Source {
    /// Whether the object belongs to this source.
    fn provides_object(&self, object: &Self::Object) -> bool;

    /// Produce the documents for one object.
    ///
    /// Fails with [`SourceError::ForeignObject`] when the object does not
    /// belong to this source.
    fn documents_for_object(&self, object: &Self::Object) -> Result<Vec<Document>, SourceError>;

    /// Produce the documents for a batch of objects.
    fn documents_for_objects(
        &self,
        objects: &[Self::Object],
    ) -> Result<Vec<Document>, SourceError> {
        let mut documents = Vec::new();
        for object in objects {
            documents.extend(self.documents_for_object(object)?);
        }
        Ok(documents)
    }

    /// Batch reverse lookup: resolve documents back to origin objects.
    ///
    /// Keys whose object no longer exists (deleted since indexing) are
    /// simply absent from the returned map; the caller skips them. Absence
    /// is never an error.
    fn objects_from_documents(
        &self,
        documents: &[Document],
    ) -> Result<HashMap<SourceKey, Self::Object>, SourceError>;
}

/// Access to a store of keyed records, the origin behind a [`RecordSource`].
pub trait RecordStore: Send + Sync {
    type Record: Send + Sync;

    /// Source-specific key of the record (e.g. a primary key).
    fn record_key(&self, record: &Self::Record) -> String;

    /// Text content to index for the record.
    fn content(&self, record: &Self::Record) -> String;

    /// Metadata attached to every document of the record.
    fn metadata(&self, _record: &Self::Record) -> Metadata {
        Metadata::new()
    }

    /// Whether this store owns the record. Lets two sources over the same
    /// record type partition it (e.g. published vs. draft).
    fn owns(&self, _record: &Self::Record) -> bool {
        true
    }

    /// Enumerate every record.
    fn fetch_all(&self) -> Result<Vec<Self::Record>, SourceError>;

    /// Fetch records by key. Missing keys are omitted, not errors.
    fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<Self::Record>, SourceError>;
}

/// Generic source over a [`RecordStore`], chunking each record's content.
///
/// Document keys are `source_id:record_key:chunk`, stable across rebuilds.
pub struct RecordSource<S: RecordStore> {
    source_id: String,
    store: S,
    chunker: Arc<dyn ChunkTransformer>,
}

impl<S: RecordStore> RecordSource<S> {
    pub fn new(source_id: impl Into<String>, store: S, chunker: Arc<dyn ChunkTransformer>) -> Self {
        Self {
            source_id: source_id.into(),
            store,
            chunker,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RecordStore> Source for RecordSource<S> {
    type Object = S::Record;

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn documents(&self) -> Result<Vec<Document>, SourceError> {
        let records = self.store.fetch_all()?;
        debug!(source_id = %self.source_id, records = records.len(), "Chunking records");

        let mut documents = Vec::new();
        for record in &records {
            documents.extend(self.documents_for_object(record)?);
        }
        Ok(documents)
    }
}

impl<S: RecordStore> ObjectSource for RecordSource<S> {
    fn provides_object(&self, object: &Self::Object) -> bool {
        self.store.owns(object)
    }

    fn documents_for_object(&self, object: &Self::Object) -> Result<Vec<Document>, SourceError> {
        if !self.provides_object(object) {
            return Err(SourceError::ForeignObject(self.source_id.clone()));
        }

        let object_key = self.store.record_key(object);
        let content = self.store.content(object);
        let mut metadata = self.store.metadata(object);
        metadata.insert("source_id".to_string(), json!(self.source_id));
        metadata.insert("object_key".to_string(), json!(object_key));

        let source_key = SourceKey::new(self.source_id.clone(), object_key);
        let documents = self
            .chunker
            .transform(&content)
            .into_iter()
            .enumerate()
            .map(|(idx, chunk)| {
                Document::new(
                    DocumentKey::new(source_key.clone(), idx as u32),
                    chunk,
                    metadata.clone(),
                )
            })
            .collect();
        Ok(documents)
    }

    fn objects_from_documents(
        &self,
        documents: &[Document],
    ) -> Result<HashMap<SourceKey, Self::Object>, SourceError> {
        let mut keys: Vec<String> = Vec::new();
        for document in documents {
            if !self.provides_document(&document.key) {
                continue;
            }
            let object_key = &document.key.source.object_key;
            if !keys.contains(object_key) {
                keys.push(object_key.clone());
            }
        }

        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let records = self.store.fetch_by_keys(&keys)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let key = SourceKey::new(self.source_id.clone(), self.store.record_key(&record));
                (key, record)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use corpus_chunking::WindowChunker;

    use super::*;

    /// Simple store over (key, text) pairs.
    struct PairStore {
        records: Vec<(String, String)>,
    }

    impl RecordStore for PairStore {
        type Record = (String, String);

        fn record_key(&self, record: &Self::Record) -> String {
            record.0.clone()
        }

        fn content(&self, record: &Self::Record) -> String {
            record.1.clone()
        }

        fn fetch_all(&self) -> Result<Vec<Self::Record>, SourceError> {
            Ok(self.records.clone())
        }

        fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<Self::Record>, SourceError> {
            Ok(self
                .records
                .iter()
                .filter(|(key, _)| keys.contains(key))
                .cloned()
                .collect())
        }
    }

    fn source(records: Vec<(&str, &str)>) -> RecordSource<PairStore> {
        let store = PairStore {
            records: records
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        RecordSource::new(
            "notes",
            store,
            Arc::new(WindowChunker::new(10, 2).unwrap()),
        )
    }

    #[test]
    fn test_documents_are_namespaced_and_numbered() {
        let source = source(vec![("a", "this text is long enough to chunk twice")]);
        let documents = source.documents().unwrap();

        assert!(documents.len() > 1);
        for (idx, document) in documents.iter().enumerate() {
            assert_eq!(document.key.source_id(), "notes");
            assert_eq!(document.key.source.object_key, "a");
            assert_eq!(document.key.chunk, idx as u32);
            assert!(source.provides_document(&document.key));
        }
    }

    #[test]
    fn test_provides_document_rejects_other_namespace() {
        let source = source(vec![("a", "text")]);
        let foreign = DocumentKey::new(SourceKey::new("other", "a"), 0);
        assert!(!source.provides_document(&foreign));
    }

    #[test]
    fn test_reverse_mapping_resolves_objects() {
        let source = source(vec![("a", "alpha content"), ("b", "beta content")]);
        let documents = source.documents().unwrap();

        let objects = source.objects_from_documents(&documents).unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects.contains_key(&SourceKey::new("notes", "a")));
        assert!(objects.contains_key(&SourceKey::new("notes", "b")));
    }

    #[test]
    fn test_deleted_objects_omitted_not_errors() {
        let source = source(vec![("a", "alpha content")]);
        let mut documents = source.documents().unwrap();
        // A document whose record has since disappeared.
        documents.push(Document::new(
            DocumentKey::new(SourceKey::new("notes", "gone"), 0),
            "stale",
            Metadata::new(),
        ));

        let objects = source.objects_from_documents(&documents).unwrap();
        assert_eq!(objects.len(), 1);
        assert!(!objects.contains_key(&SourceKey::new("notes", "gone")));
    }

    #[test]
    fn test_batch_documents_for_objects() {
        let source = source(vec![("a", "alpha"), ("b", "beta")]);
        let objects = vec![
            ("a".to_string(), "alpha".to_string()),
            ("b".to_string(), "beta".to_string()),
        ];
        let documents = source.documents_for_objects(&objects).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].key.source.object_key, "a");
        assert_eq!(documents[1].key.source.object_key, "b");
    }

    #[test]
    fn test_rebuild_produces_identical_keys() {
        let source = source(vec![("a", "the same content every time, long enough")]);
        let first: Vec<String> = source
            .documents()
            .unwrap()
            .iter()
            .map(|d| d.key.to_string())
            .collect();
        let second: Vec<String> = source
            .documents()
            .unwrap()
            .iter()
            .map(|d| d.key.to_string())
            .collect();
        assert_eq!(first, second);
    }
}
