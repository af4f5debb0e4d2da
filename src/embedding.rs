//! Embedding backends.
//!
//! Implementations of [`Embedder`] selected by `[embedding] provider`:
//! - **[`DisabledEmbedder`]**: returns errors; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: calls an OpenAI-compatible `/embeddings` endpoint.
//! - **[`OllamaEmbedder`]**: calls a local Ollama instance's `/api/embed` endpoint.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use doc_summarizer::config::EmbeddingConfig;
//! # use doc_summarizer::embedding::create_embedder;
//! let config = EmbeddingConfig {
//!     provider: "disabled".to_string(),
//!     ..EmbeddingConfig::default()
//! };
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use doc_summarizer_core::embedding::Embedder;
use doc_summarizer_core::error::EmbeddingError;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::http::{self, HttpFailure};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

impl From<HttpFailure> for EmbeddingError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Request(msg) => EmbeddingError::Request(msg),
            HttpFailure::Status { status, body } => EmbeddingError::Status { status, body },
            HttpFailure::Malformed(msg) => EmbeddingError::Malformed(msg),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

// ============ Disabled ============

/// An embedder that always fails.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Disabled)
    }
}

// ============ OpenAI ============

/// Embedder using the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let base = config.url.as_deref().unwrap_or(OPENAI_BASE_URL);

        Ok(Self {
            client: http::client(config.timeout_secs).map_err(EmbeddingError::from)?,
            url: http::join_url(base, "embeddings"),
            api_key,
            model: config.model.clone(),
            dims: config.dims.unwrap_or(0),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response: OpenAIEmbedResponse = http::post_json(
            &self.client,
            &self.url,
            Some(&self.api_key),
            &body,
            self.max_retries,
        )
        .await?;
        order_by_index(response.data, texts.len())
    }
}

/// Reorder `data[]` by its `index` field so vectors line up with the inputs.
fn order_by_index(
    data: Vec<OpenAIEmbedding>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            EmbeddingError::Malformed(format!("index {} out of range", item.index))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(EmbeddingError::Malformed(format!(
                "duplicate index {}",
                item.index
            )));
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| EmbeddingError::Malformed(format!("missing index {}", i))))
        .collect()
}

// ============ Ollama ============

/// Embedder using a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default
/// `http://localhost:11434`). The model must already be pulled, e.g.
/// `ollama pull nomic-embed-text`.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        Ok(Self {
            client: http::client(config.timeout_secs).map_err(EmbeddingError::from)?,
            url: http::join_url(base, "api/embed"),
            model: config.model.clone(),
            dims: config.dims.unwrap_or(0),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let response: OllamaEmbedResponse =
            http::post_json(&self.client, &self.url, None, &body, self.max_retries)
                .await
                .map_err(|e| match e {
                    HttpFailure::Request(msg) => EmbeddingError::Request(format!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url, msg
                    )),
                    other => other.into(),
                })?;
        Ok(response.embeddings)
    }
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Embedder |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
