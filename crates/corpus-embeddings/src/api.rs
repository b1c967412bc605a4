//! OpenAI-compatible embeddings API client.
//!
//! Calls a `/v1/embeddings`-shaped endpoint over blocking HTTP. The numeric
//! work happens on the remote side; this transformer only batches requests
//! and maps responses back onto documents.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use corpus_types::{Document, EmbeddedDocument};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingTransformer};

/// Default number of documents sent per API request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for [`ApiEmbedder`].
#[derive(Debug, Clone)]
pub struct ApiEmbedderConfig {
    /// Full endpoint URL, e.g. `https://api.openai.com/v1/embeddings`
    pub endpoint: String,
    /// Model name passed in the request body
    pub model: String,
    /// Optional bearer token
    pub api_key: Option<SecretString>,
    /// Documents per request when batching
    pub batch_size: usize,
}

impl ApiEmbedderConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}

/// Embedding transformer backed by an OpenAI-compatible embeddings endpoint.
pub struct ApiEmbedder {
    config: ApiEmbedderConfig,
    client: reqwest::blocking::Client,
}

impl ApiEmbedder {
    /// Create a new API embedder.
    ///
    /// Fails with [`EmbeddingError::Config`] when the endpoint or model is
    /// empty or the batch size is zero.
    pub fn new(config: ApiEmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.endpoint.is_empty() {
            return Err(EmbeddingError::Config("endpoint must not be empty".into()));
        }
        if config.model.is_empty() {
            return Err(EmbeddingError::Config("model must not be empty".into()));
        }
        if config.batch_size == 0 {
            return Err(EmbeddingError::Config("batch_size must be at least 1".into()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { config, client })
    }

    /// Embed a batch of texts in a single request.
    ///
    /// The response must contain exactly one vector per input, in input
    /// order; anything else is a [`EmbeddingError::CountMismatch`].
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{}: {}", status, body)));
        }

        let mut payload: EmbeddingsResponse = response.json()?;
        if payload.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: payload.data.len(),
            });
        }

        // The API is allowed to return items out of order.
        payload.data.sort_by_key(|item| item.index);

        Ok(payload
            .data
            .into_iter()
            .map(|item| Embedding::new(item.embedding))
            .collect())
    }
}

impl EmbeddingTransformer for ApiEmbedder {
    fn transformer_id(&self) -> String {
        format!("api:{}@{}", self.config.model, self.config.endpoint)
    }

    fn embed_string(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed_batch(&[text])?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::Api("empty embedding response".into()))
    }

    fn embed_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<EmbeddedDocument>, EmbeddingError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut embedded = Vec::with_capacity(documents.len());

        for batch in documents.chunks(self.config.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|d| d.content.as_str()).collect();
            debug!(count = texts.len(), "Embedding batch via API");
            let embeddings = self.embed_batch(&texts)?;

            for (document, embedding) in batch.iter().zip(embeddings) {
                embedded.push(document.clone().with_embedding(embedding.values));
            }
        }

        Ok(embedded)
    }
}
