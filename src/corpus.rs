//! Corpus index: every chunk of the document folder, keyed by file.
//!
//! Built fresh by [`CorpusIndex::ingest`] on each call. Ingestion is the
//! loader followed by the chunker; the index only adds lookup by file name.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use doc_summarizer_core::chunk;
use doc_summarizer_core::error::{ChunkError, LoadError};
use doc_summarizer_core::models::Chunk;
use thiserror::Error;
use tracing::info;

use crate::loader::{self, LoadReport};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// All chunks of one folder scan.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    all_chunks: Vec<Chunk>,
    by_file: BTreeMap<String, Vec<Chunk>>,
    failures: Vec<(String, LoadError)>,
}

impl CorpusIndex {
    /// Load and chunk every supported file in `folder`.
    pub fn ingest(
        folder: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, IngestError> {
        chunk::validate(chunk_size, chunk_overlap)?;
        let report = loader::load_folder(folder)?;
        let index = Self::from_report(report, chunk_size, chunk_overlap)?;

        info!(
            folder = %folder.display(),
            files = index.by_file.len(),
            chunks = index.all_chunks.len(),
            failures = index.failures.len(),
            "ingested documents"
        );

        Ok(index)
    }

    /// Chunk an already loaded folder.
    pub fn from_report(
        report: LoadReport,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, ChunkError> {
        let all_chunks = chunk::split(&report.documents, chunk_size, chunk_overlap)?;

        let mut by_file: BTreeMap<String, Vec<Chunk>> = report
            .files
            .into_iter()
            .map(|name| (name, Vec::new()))
            .collect();
        for c in &all_chunks {
            by_file
                .entry(c.source_file.clone())
                .or_default()
                .push(c.clone());
        }

        Ok(Self {
            all_chunks,
            by_file,
            failures: report.failures,
        })
    }

    /// Sorted names of every loaded file, including files with no text.
    pub fn list_file_names(&self) -> Vec<String> {
        self.by_file.keys().cloned().collect()
    }

    /// Chunks of one file in sequence order; empty for unknown names.
    pub fn chunks_for(&self, name: &str) -> &[Chunk] {
        self.by_file.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Chunks of the named files, in request order. Unknown and repeated
    /// names contribute nothing.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Vec<Chunk> {
        let mut seen = HashSet::new();
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| seen.insert(*name))
            .flat_map(|name| self.chunks_for(name).iter().cloned())
            .collect()
    }

    pub fn all_chunks(&self) -> &[Chunk] {
        &self.all_chunks
    }

    pub fn failures(&self) -> &[(String, LoadError)] {
        &self.failures
    }
}
