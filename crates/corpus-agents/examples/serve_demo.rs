//! Demo: serve a search agent over an in-memory index
//!
//! Usage:
//! ```bash
//! cargo run --example serve_demo
//! curl -s -X POST localhost:8080/agents/search-notes \
//!     -d '{"arguments": {"query": "how does chunk overlap work"}}'
//! ```
//!
//! Builds a small index of notes, registers an agent that answers search
//! queries against it, and serves the agents endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use corpus_agents::{
    router, serve, Agent, AgentError, AgentParameter, AgentRegistry, AnonymousContext,
    ParameterKind,
};
use corpus_chunking::WindowChunker;
use corpus_embeddings::{Embedding, EmbeddingError, EmbeddingTransformer};
use corpus_index::{RecordSource, RecordStore, SearchOptions, SourceError, VectorIndex};
use corpus_storage::MemoryProvider;

#[derive(Debug, Clone)]
struct Note {
    key: String,
    body: String,
}

struct NoteStore {
    notes: Mutex<Vec<Note>>,
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

/// Toy embedder: hashes character trigrams into a fixed-size vector. Good
/// enough for a demo without a network call.
struct TrigramEmbedder;

impl EmbeddingTransformer for TrigramEmbedder {
    fn transformer_id(&self) -> String {
        "demo:trigram".to_string()
    }

    fn embed_string(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vector = vec![0.0f32; 256];
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        for window in chars.windows(3) {
            let mut hash: u32 = 2166136261;
            for c in window {
                hash = (hash ^ *c as u32).wrapping_mul(16777619);
            }
            vector[(hash % 256) as usize] += 1.0;
        }
        Ok(Embedding::new(vector))
    }
}

struct SearchAgent {
    index: VectorIndex<Note>,
}

impl Agent for SearchAgent {
    fn slug(&self) -> &str {
        "search-notes"
    }

    fn description(&self) -> &str {
        "Searches the demo notes and returns the best-matching notes"
    }

    fn parameters(&self) -> Vec<AgentParameter> {
        vec![AgentParameter::new(
            "query",
            ParameterKind::String,
            "Free-text search query",
        )]
    }

    fn execute(&self, arguments: &Map<String, Value>) -> Result<Value, AgentError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidArguments("query is required".into()))?;

        let results = self
            .index
            .search_sources(query, SearchOptions::default().with_limit(3))
            .map_err(|e| AgentError::Execution(e.to_string()))?;

        let notes: Vec<Value> = results
            .iter()
            .map_err(|e| AgentError::Execution(e.to_string()))?
            .map(|scored| {
                json!({
                    "key": scored.object.key,
                    "body": scored.object.body,
                    "score": scored.score,
                })
            })
            .collect();
        Ok(json!(notes))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let notes = vec![
        Note {
            key: "chunking".into(),
            body: "Chunk transformers split text into overlapping windows so that \
                   context is not lost at chunk boundaries. Overlap repeats the \
                   tail of one chunk at the head of the next."
                .into(),
        },
        Note {
            key: "overfetch".into(),
            body: "Source-level queries fetch more raw documents than requested, \
                   collapse duplicates from the same source, and re-query with a \
                   doubled fetch size when too few unique sources remain."
                .into(),
        },
        Note {
            key: "laziness".into(),
            body: "Result sets are lazy: constructing one performs no storage \
                   call, and the search executes exactly once on first access."
                .into(),
        },
    ];

    let index = VectorIndex::new(
        "demo-notes",
        vec![Arc::new(RecordSource::new(
            "notes",
            NoteStore {
                notes: Mutex::new(notes),
            },
            Arc::new(WindowChunker::new(200, 40)?),
        ))],
        Arc::new(TrigramEmbedder),
        Arc::new(MemoryProvider::new()),
    );

    let (stats, index) = tokio::task::spawn_blocking(move || {
        let stats = index.build()?;
        Ok::<_, anyhow::Error>((stats, index))
    })
    .await??;
    println!(
        "Indexed {} documents from {} sources",
        stats.embedded, stats.sources
    );

    let registry = AgentRegistry::new();
    registry.register(Arc::new(SearchAgent { index }))?;

    let addr: SocketAddr = "127.0.0.1:8080".parse()?;
    println!("Listening on http://{addr} (POST /agents/search-notes)");
    serve(router(Arc::new(registry), Arc::new(AnonymousContext)), addr).await?;
    Ok(())
}
