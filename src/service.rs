//! Request-level operations shared by the CLI and the HTTP server.
//!
//! [`DocService`] owns the configuration, the embedding and chat backends,
//! and the embedding cache. Every call re-scans the document folder, so
//! files added or removed between requests are picked up without a restart.

use std::sync::Arc;

use doc_summarizer_core::embedding::{Embedder, EmbeddingCache};
use doc_summarizer_core::error::{ChunkError, LoadError, PipelineError};
use doc_summarizer_core::models::ScoredChunk;
use doc_summarizer_core::pipeline::{AnswerGenerator, ChatModel};
use doc_summarizer_core::store::{BuildOptions, VectorStore};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::corpus::{CorpusIndex, IngestError};
use crate::embedding::create_embedder;
use crate::llm::create_chat_model;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable error code.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Load(_) => "load_error",
            ServiceError::Chunk(_) => "chunk_error",
            ServiceError::Pipeline(e) => e.kind(),
            ServiceError::InvalidRequest(_) => "bad_request",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<IngestError> for ServiceError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Load(e) => ServiceError::Load(e),
            IngestError::Chunk(e) => ServiceError::Chunk(e),
        }
    }
}

/// Names of the documents available for selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    pub file_names: Vec<String>,
}

/// A retrieved chunk, as reported alongside an answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub source_file: String,
    pub sequence_index: usize,
    pub page: Option<u32>,
    pub score: f32,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(s: &ScoredChunk) -> Self {
        Self {
            source_file: s.chunk.source_file.clone(),
            sequence_index: s.chunk.sequence_index,
            page: s.chunk.page,
            score: s.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub answer: String,
    pub standalone_question: String,
    pub sources: Vec<SourceRef>,
}

pub struct DocService {
    config: Config,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    cache: Option<EmbeddingCache>,
}

impl DocService {
    /// Build a service with explicit backends.
    pub fn new(config: Config, embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>) -> Self {
        let cache = config.embedding.cache.then(EmbeddingCache::new);
        Self {
            config,
            embedder,
            chat,
            cache,
        }
    }

    /// Build a service with the backends named in `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let chat = create_chat_model(&config.llm)?;
        Ok(Self::new(config, embedder, chat))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan and chunk the document folder.
    pub async fn ingest(&self) -> Result<CorpusIndex, ServiceError> {
        let folder = self.config.docs.folder.clone();
        let size = self.config.chunking.chunk_size;
        let overlap = self.config.chunking.chunk_overlap;

        let index = tokio::task::spawn_blocking(move || CorpusIndex::ingest(&folder, size, overlap))
            .await
            .map_err(|e| ServiceError::Internal(format!("ingest task failed: {}", e)))??;
        Ok(index)
    }

    /// List every loaded document name, sorted.
    pub async fn list_documents(&self) -> Result<FileList, ServiceError> {
        let index = self.ingest().await?;
        Ok(FileList {
            file_names: index.list_file_names(),
        })
    }

    /// Answer `question` using only the chunks of `selected_files`.
    ///
    /// Unknown names contribute no chunks. With nothing selected the model
    /// still answers, without context.
    pub async fn answer<S: AsRef<str>>(
        &self,
        question: &str,
        selected_files: &[S],
    ) -> Result<AnswerResponse, ServiceError> {
        if question.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "question must not be empty".to_string(),
            ));
        }

        let index = self.ingest().await?;
        let chunks = index.select(selected_files);
        debug!(
            selected = selected_files.len(),
            chunks = chunks.len(),
            "selected chunks"
        );

        let options = BuildOptions {
            batch_size: self.config.embedding.batch_size,
            concurrency: self.config.embedding.concurrency,
        };
        let store = VectorStore::build(
            chunks,
            Arc::clone(&self.embedder),
            options,
            self.cache.as_ref(),
        )
        .await
        .map_err(PipelineError::from)?;

        let generator =
            AnswerGenerator::new(Arc::clone(&self.chat), store).with_k(self.config.retrieval.k);
        let answered = generator.answer(question).await?;

        info!(
            standalone = %answered.standalone_question,
            sources = answered.sources.len(),
            model = self.chat.model_name(),
            "answered question"
        );

        Ok(AnswerResponse {
            sources: answered.sources.iter().map(SourceRef::from).collect(),
            answer: answered.answer,
            standalone_question: answered.standalone_question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let e = ServiceError::InvalidRequest("x".into());
        assert_eq!(e.kind(), "bad_request");
        let e: ServiceError = ChunkError::InvalidParameters {
            chunk_size: 1,
            chunk_overlap: 1,
        }
        .into();
        assert_eq!(e.kind(), "chunk_error");
        let e: ServiceError = PipelineError::from(
            doc_summarizer_core::error::EmbeddingError::Disabled,
        )
        .into();
        assert_eq!(e.kind(), "embedding_error");
    }

    #[test]
    fn answer_response_is_camel_case() {
        let resp = AnswerResponse {
            answer: "a".into(),
            standalone_question: "q".into(),
            sources: vec![SourceRef {
                source_file: "a.txt".into(),
                sequence_index: 0,
                page: None,
                score: 1.0,
            }],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["standaloneQuestion"], "q");
        assert_eq!(json["sources"][0]["sourceFile"], "a.txt");
        assert_eq!(json["sources"][0]["sequenceIndex"], 0);
    }
}
