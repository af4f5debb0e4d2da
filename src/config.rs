//! Configuration parsing and validation.
//!
//! doc-summarizer is configured with a TOML file passed via `--config`.
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration that reads `./docs` and talks to
//! OpenAI.
//!
//! # Example
//!
//! ```toml
//! [docs]
//! folder = "./docs"
//!
//! [chunking]
//! chunk_size = 1536
//! chunk_overlap = 128
//!
//! [retrieval]
//! k = 4
//!
//! [embedding]
//! provider = "ollama"
//! model = "nomic-embed-text"
//! url = "http://localhost:11434"
//!
//! [llm]
//! provider = "ollama"
//! model = "llama3.1"
//!
//! [server]
//! bind = "127.0.0.1:30080"
//! ```
//!
//! API keys are never read from the file; OpenAI backends take
//! `OPENAI_API_KEY` from the environment.

use anyhow::{bail, Context, Result};
use doc_summarizer_core::chunk::{self, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use doc_summarizer_core::store::DEFAULT_K;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Provider names accepted by `[embedding]` and `[llm]`.
pub const PROVIDERS: [&str; 3] = ["disabled", "openai", "ollama"];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub docs: DocsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocsConfig {
    /// Folder scanned (non-recursively) for `.txt` and `.pdf` files.
    pub folder: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./docs"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters repeated from the end of the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks passed to the model as context.
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    /// Expected dimensionality; inferred from the first response when unset.
    pub dims: Option<usize>,
    /// Base URL override (OpenAI-compatible `/embeddings` or Ollama root).
    pub url: Option<String>,
    pub batch_size: usize,
    /// Maximum embedding requests in flight per question.
    pub concurrency: usize,
    /// Reuse vectors for identical chunk text across requests.
    pub cache: bool,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dims: None,
            url: None,
            batch_size: 64,
            concurrency: 4,
            cache: true,
            max_retries: 0,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub url: Option<String>,
    /// Completion token limit.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            url: None,
            max_tokens: 2048,
            temperature: None,
            max_retries: 0,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:30080".to_string(),
        }
    }
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        chunk::validate(self.chunking.chunk_size, self.chunking.chunk_overlap)
            .context("invalid [chunking] section")?;

        if self.retrieval.k < 1 {
            bail!("retrieval.k must be >= 1");
        }

        if self.embedding.batch_size < 1 {
            bail!("embedding.batch_size must be >= 1");
        }
        if self.embedding.concurrency < 1 {
            bail!("embedding.concurrency must be >= 1");
        }
        if self.embedding.dims == Some(0) {
            bail!("embedding.dims must be > 0 when set");
        }
        if self.embedding.is_enabled() && self.embedding.model.trim().is_empty() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                self.embedding.provider
            );
        }

        if self.llm.max_tokens < 1 {
            bail!("llm.max_tokens must be >= 1");
        }
        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                bail!("llm.temperature must be in [0.0, 2.0]");
            }
        }

        check_provider("embedding", &self.embedding.provider)?;
        check_provider("llm", &self.llm.provider)?;

        Ok(())
    }
}

fn check_provider(section: &str, provider: &str) -> Result<()> {
    if !PROVIDERS.contains(&provider) {
        bail!(
            "Unknown {} provider: '{}'. Must be disabled, openai, or ollama.",
            section,
            provider
        );
    }
    Ok(())
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Read, parse, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}
