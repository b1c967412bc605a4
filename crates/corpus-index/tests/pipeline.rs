//! End-to-end pipeline tests: ingest, laziness, and overfetch resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use corpus_chunking::WindowChunker;
use corpus_embeddings::{Embedding, EmbeddingError, EmbeddingTransformer};
use corpus_index::{
    RecordSource, RecordStore, SearchOptions, SourceError, SourceResults, VectorIndex,
};
use corpus_storage::{MemoryProvider, ScoredDocument, StorageError, StorageProvider};
use corpus_types::{Document, DocumentKey, EmbeddedDocument, Metadata, SourceKey};

/// A note record: the domain object behind the test source.
#[derive(Debug, Clone, PartialEq)]
struct Note {
    key: String,
    body: String,
}

/// Record store over a plain vector of notes.
struct NoteStore {
    notes: Mutex<Vec<Note>>,
}

impl NoteStore {
    fn new(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(notes),
        }
    }
}

impl RecordStore for NoteStore {
    type Record = Note;

    fn record_key(&self, record: &Note) -> String {
        record.key.clone()
    }

    fn content(&self, record: &Note) -> String {
        record.body.clone()
    }

    fn fetch_all(&self) -> Result<Vec<Note>, SourceError> {
        Ok(self.notes.lock().unwrap().clone())
    }

    fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<Note>, SourceError> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|note| keys.contains(&note.key))
            .cloned()
            .collect())
    }
}

/// Embedder that maps every string to a fixed query direction. Storage
/// ranking is controlled entirely by the stored document vectors.
struct FixedEmbedder;

impl EmbeddingTransformer for FixedEmbedder {
    fn transformer_id(&self) -> String {
        "fixed".to_string()
    }

    fn embed_string(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(Embedding::new(vec![1.0, 0.0]))
    }
}

/// Storage wrapper that counts queries and records requested fetch sizes.
struct CountingStorage {
    inner: MemoryProvider,
    queries: AtomicUsize,
    fetch_sizes: Mutex<Vec<usize>>,
}

impl CountingStorage {
    fn new() -> Self {
        Self {
            inner: MemoryProvider::new(),
            queries: AtomicUsize::new(0),
            fetch_sizes: Mutex::new(Vec::new()),
        }
    }

    fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn fetch_sizes(&self) -> Vec<usize> {
        self.fetch_sizes.lock().unwrap().clone()
    }
}

impl StorageProvider for CountingStorage {
    fn add(&self, documents: Vec<EmbeddedDocument>) -> Result<(), StorageError> {
        self.inner.add(documents)
    }

    fn delete(&self, keys: &[DocumentKey]) -> Result<(), StorageError> {
        self.inner.delete(keys)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear()
    }

    fn query(
        &self,
        vector: &Embedding,
        limit: usize,
        deadline: Option<Instant>,
    ) -> Result<Vec<ScoredDocument>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.fetch_sizes.lock().unwrap().push(limit);
        self.inner.query(vector, limit, deadline)
    }

    fn len(&self) -> Result<usize, StorageError> {
        self.inner.len()
    }
}

/// Document for `notes:<object>:<chunk>` with a vector whose similarity to
/// the fixed query direction decreases as `rank` grows.
fn stored_doc(object: &str, chunk: u32, rank: usize) -> EmbeddedDocument {
    Document::new(
        DocumentKey::new(SourceKey::new("notes", object), chunk),
        format!("{} chunk {}", object, chunk),
        Metadata::new(),
    )
    .with_embedding(vec![1.0, 0.02 * rank as f32])
}

fn note(key: &str, body: &str) -> Note {
    Note {
        key: key.to_string(),
        body: body.to_string(),
    }
}

/// Index over a note store and a counting storage seeded with `docs`.
fn index_with(
    notes: Vec<Note>,
    docs: Vec<EmbeddedDocument>,
) -> (VectorIndex<Note>, Arc<CountingStorage>) {
    let storage = Arc::new(CountingStorage::new());
    storage.add(docs).unwrap();

    let source = RecordSource::new(
        "notes",
        NoteStore::new(notes),
        Arc::new(WindowChunker::new(1000, 100).unwrap()),
    );
    let index = VectorIndex::new(
        "test-index",
        vec![Arc::new(source)],
        Arc::new(FixedEmbedder),
        storage.clone(),
    );
    (index, storage)
}

fn result_keys(results: &SourceResults<Note>) -> Vec<String> {
    results
        .items()
        .unwrap()
        .iter()
        .map(|scored| scored.key.object_key.clone())
        .collect()
}

#[test]
fn test_build_ingests_all_sources() {
    let (index, storage) = index_with(
        vec![note("a", "alpha body"), note("b", "beta body")],
        Vec::new(),
    );

    let stats = index.build().unwrap();
    assert_eq!(stats.sources, 1);
    assert_eq!(stats.documents, 2);
    assert_eq!(stats.embedded, 2);
    assert_eq!(storage.len().unwrap(), 2);
}

#[test]
fn test_rebuild_is_idempotent() {
    let (index, storage) = index_with(vec![note("a", "alpha body")], Vec::new());

    index.build().unwrap();
    index.build().unwrap();
    // Stable keys: the second build upserts rather than duplicating.
    assert_eq!(storage.len().unwrap(), 1);
}

#[test]
fn test_three_sources_four_chunks_single_round() {
    // 3 source objects x 4 chunks = 12 documents. The top 6 ranks cover
    // all three sources, so limit=3 with multiplier 2 resolves in one
    // fetch of exactly 6.
    let mut docs = Vec::new();
    let objects = ["a", "b", "c"];
    for rank in 0..12 {
        let object = objects[rank % 3];
        let chunk = (rank / 3) as u32;
        docs.push(stored_doc(object, chunk, rank));
    }
    let notes = vec![note("a", "a"), note("b", "b"), note("c", "c")];
    let (index, storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(3))
        .unwrap();

    assert_eq!(result_keys(&results), vec!["a", "b", "c"]);
    assert_eq!(storage.query_count(), 1);
    assert_eq!(storage.fetch_sizes(), vec![6]);
}

#[test]
fn test_overfetch_runs_second_round_when_duplicates_dominate() {
    // Ranks 0-5 belong to only two sources; the third appears at rank 6.
    let mut docs = Vec::new();
    for rank in 0..5 {
        docs.push(stored_doc("a", rank as u32, rank));
    }
    docs.push(stored_doc("b", 0, 5));
    docs.push(stored_doc("c", 0, 6));
    let notes = vec![note("a", "a"), note("b", "b"), note("c", "c")];
    let (index, storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(3))
        .unwrap();

    assert_eq!(result_keys(&results), vec!["a", "b", "c"]);
    // First round fetches 6, finds 2 unique; second fetches 12.
    assert_eq!(storage.fetch_sizes(), vec![6, 12]);
}

#[test]
fn test_underfill_returns_short_result_without_error() {
    // Thirty documents but only two unique sources; limit 5 can never be
    // satisfied. The loop must stop and hand back what it found.
    let mut docs = Vec::new();
    for rank in 0..30 {
        let object = if rank % 2 == 0 { "a" } else { "b" };
        docs.push(stored_doc(object, (rank / 2) as u32, rank));
    }
    let notes = vec![note("a", "a"), note("b", "b")];
    let (index, _storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(5))
        .unwrap();

    assert_eq!(results.len().unwrap(), 2);
    assert_eq!(result_keys(&results), vec!["a", "b"]);
}

#[test]
fn test_no_duplicate_sources_in_results() {
    let mut docs = Vec::new();
    for rank in 0..20 {
        let object = ["a", "b", "c", "d"][rank % 4];
        docs.push(stored_doc(object, (rank / 4) as u32, rank));
    }
    let notes = vec![
        note("a", "a"),
        note("b", "b"),
        note("c", "c"),
        note("d", "d"),
    ];
    let (index, _storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(10))
        .unwrap();

    let keys = result_keys(&results);
    let mut deduped = keys.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(keys.len(), deduped.len());
}

#[test]
fn test_results_ranked_by_best_chunk_score() {
    // b's best chunk outranks a's best chunk.
    let docs = vec![
        stored_doc("b", 0, 0),
        stored_doc("a", 0, 1),
        stored_doc("b", 1, 2),
        stored_doc("a", 1, 3),
    ];
    let notes = vec![note("a", "a"), note("b", "b")];
    let (index, _storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(2))
        .unwrap();

    assert_eq!(result_keys(&results), vec!["b", "a"]);
    let items = results.items().unwrap();
    assert!(items[0].score >= items[1].score);
}

#[test]
fn test_lazy_materialization_queries_once() {
    let docs = vec![stored_doc("a", 0, 0), stored_doc("b", 0, 1)];
    let notes = vec![note("a", "a"), note("b", "b")];
    let (index, storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(2))
        .unwrap();
    // Construction performs no storage call.
    assert_eq!(storage.query_count(), 0);

    results.items().unwrap();
    assert_eq!(storage.query_count(), 1);

    // Repeated access re-uses the materialized result.
    results.items().unwrap();
    results.len().unwrap();
    for _ in results.iter().unwrap() {}
    assert_eq!(storage.query_count(), 1);
}

#[test]
fn test_document_view_is_lazy_too() {
    let docs = vec![stored_doc("a", 0, 0)];
    let (index, storage) = index_with(vec![note("a", "a")], docs);

    let results = index.search("query").unwrap();
    assert_eq!(storage.query_count(), 0);
    results.items().unwrap();
    results.items().unwrap();
    assert_eq!(storage.query_count(), 1);
}

#[test]
fn test_view_conversion_preserves_unique_sources() {
    let mut docs = Vec::new();
    for rank in 0..12 {
        let object = ["a", "b", "c"][rank % 3];
        docs.push(stored_doc(object, (rank / 3) as u32, rank));
    }
    let notes = vec![note("a", "a"), note("b", "b"), note("c", "c")];
    let (index, _storage) = index_with(notes, docs);

    let sources = index
        .search_sources("query", SearchOptions::default().with_limit(3))
        .unwrap();
    let first: Vec<String> = result_keys(&sources);

    // source view -> document view -> source view again
    let roundtrip = sources.to_documents().to_sources();
    let second: Vec<String> = result_keys(&roundtrip);

    assert_eq!(first, second);
}

#[test]
fn test_deleted_source_objects_are_skipped() {
    // Storage still holds chunks for "ghost", but the record is gone.
    let docs = vec![
        stored_doc("ghost", 0, 0),
        stored_doc("a", 0, 1),
        stored_doc("b", 0, 2),
    ];
    let notes = vec![note("a", "a"), note("b", "b")];
    let (index, _storage) = index_with(notes, docs);

    let results = index
        .search_sources("query", SearchOptions::default().with_limit(2))
        .unwrap();

    // ghost is silently excluded, not an error.
    assert_eq!(result_keys(&results), vec!["a", "b"]);
}

#[test]
fn test_empty_query_rejected() {
    let (index, _storage) = index_with(vec![note("a", "a")], Vec::new());
    assert!(index.search("   ").is_err());
}

#[test]
fn test_find_similar_requires_owning_source() {
    let docs = vec![stored_doc("a", 0, 0)];
    let (index, _storage) = index_with(vec![note("a", "alpha body")], docs);

    let results = index.find_similar(&note("a", "alpha body")).unwrap();
    assert!(!results.items().unwrap().is_empty());
}

#[test]
fn test_update_object_upserts_in_place() {
    let storage = Arc::new(CountingStorage::new());
    let source = Arc::new(RecordSource::new(
        "notes",
        NoteStore::new(vec![note("a", "first draft")]),
        Arc::new(WindowChunker::new(1000, 100).unwrap()),
    ));
    let index = VectorIndex::new(
        "test-index",
        vec![source.clone()],
        Arc::new(FixedEmbedder),
        storage.clone(),
    );
    index.build().unwrap();

    let revised = note("a", "second draft");
    source.store().notes.lock().unwrap()[0] = revised.clone();
    index.update_object(&revised).unwrap();

    // Same key, replaced content, no duplicate documents.
    assert_eq!(storage.len().unwrap(), 1);
    let results = index.search("query").unwrap();
    assert_eq!(results.items().unwrap()[0].document.content, "second draft");
}

#[test]
fn test_delete_object_removes_its_chunks() {
    let (index, storage) = index_with(
        vec![note("a", "alpha body"), note("b", "beta body")],
        Vec::new(),
    );
    index.build().unwrap();
    assert_eq!(storage.len().unwrap(), 2);

    index.delete_object(&note("a", "alpha body")).unwrap();
    assert_eq!(storage.len().unwrap(), 1);
}

#[test]
fn test_expired_deadline_surfaces_storage_error() {
    let docs = vec![stored_doc("a", 0, 0)];
    let (index, _storage) = index_with(vec![note("a", "a")], docs);

    let past = Instant::now() - std::time::Duration::from_millis(10);
    let results = index
        .search_sources(
            "query",
            SearchOptions::default().with_limit(1).with_deadline(past),
        )
        .unwrap();

    assert!(results.items().is_err());
}
