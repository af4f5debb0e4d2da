//! Error taxonomy shared by the core and the application crate.
//!
//! Each request-level error exposes a stable machine-readable
//! [`kind`](PipelineError::kind) used by the HTTP surface.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read the document folder or decode one file in it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read document folder {}: {source}", path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
}

/// Invalid chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("invalid chunking parameters: chunk_size={chunk_size}, chunk_overlap={chunk_overlap} (need 0 <= overlap < size)")]
    InvalidParameters {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}

/// Embedding backend failure or a vector of the wrong shape.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider is disabled")]
    Disabled,

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

/// Language-model call failure.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("chat provider is disabled")]
    Disabled,

    #[error("chat request failed: {0}")]
    Request(String),

    #[error("chat API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed chat response: {0}")]
    Malformed(String),

    #[error("chat model returned an empty response")]
    EmptyResponse,
}

/// A failure in one of the answer pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Embedding(_) => "embedding_error",
            PipelineError::Generation(_) => "generation_error",
        }
    }
}
