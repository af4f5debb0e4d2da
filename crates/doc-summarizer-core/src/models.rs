//! Data types that flow through ingestion and retrieval.

use serde::Serialize;

/// Normalized text produced by the loader for one file (or one PDF page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    /// File name within the document folder, e.g. `"a.txt"`.
    pub source_file: String,
    /// 1-based page number for PDF documents.
    pub page: Option<u32>,
}

impl Document {
    pub fn new(source_file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_file: source_file.into(),
            page: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A contiguous window of a [`Document`]'s content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub content: String,
    pub source_file: String,
    /// Position within the source file, starting at 0 and ascending across pages.
    pub sequence_index: usize,
    pub page: Option<u32>,
    /// Char offset of the window within its document.
    pub offset: usize,
}

/// A chunk returned by retrieval together with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
