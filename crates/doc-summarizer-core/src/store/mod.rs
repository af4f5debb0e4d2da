//! Request-scoped in-memory vector store.
//!
//! A [`VectorStore`] holds `(Chunk, vector)` pairs for exactly the chunks a
//! single question was asked against. It is built, queried, and dropped
//! within one request; nothing is persisted or shared.
//!
//! # Building
//!
//! [`VectorStore::build`] embeds chunks in batches of `batch_size`, with at
//! most `concurrency` batches in flight. Chunks whose content is already in
//! the optional [`EmbeddingCache`] are not re-embedded, and identical content
//! within one build is embedded once. The first failing batch aborts the
//! build and drops the remaining in-flight requests.
//!
//! # Ranking
//!
//! Retrieval is brute-force cosine similarity over every stored vector.
//! Results are ordered by score (desc), then `sequence_index` (asc), then
//! `source_file` (asc), so the ranking does not depend on insertion order.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::embedding::{check_vectors, content_hash, cosine_similarity, Embedder, EmbeddingCache};
use crate::error::EmbeddingError;
use crate::models::{Chunk, ScoredChunk};

/// Number of chunks retrieved when the caller does not specify `k`.
pub const DEFAULT_K: usize = 4;

/// Batching and fan-out limits for [`VectorStore::build`].
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Texts per embedding call.
    pub batch_size: usize,
    /// Maximum embedding calls in flight.
    pub concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            concurrency: 4,
        }
    }
}

struct Entry {
    chunk: Chunk,
    vector: Arc<[f32]>,
}

/// Ephemeral collection of embedded chunks for one request.
pub struct VectorStore {
    entries: Vec<Entry>,
    embedder: Arc<dyn Embedder>,
}

impl VectorStore {
    /// Embed `chunks` and return a store over them.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        options: BuildOptions,
        cache: Option<&EmbeddingCache>,
    ) -> Result<Self, EmbeddingError> {
        let hashes: Vec<String> = chunks.iter().map(|c| content_hash(&c.content)).collect();
        let snapshot = cache.map(EmbeddingCache::snapshot);

        let mut vectors: Vec<Option<Arc<[f32]>>> = hashes
            .iter()
            .map(|h| snapshot.as_ref().and_then(|s| s.get(h).cloned()))
            .collect();
        let cached = vectors.iter().filter(|v| v.is_some()).count();

        let mut seen = HashSet::new();
        let pending: Vec<(String, String)> = vectors
            .iter()
            .enumerate()
            .filter(|(i, v)| v.is_none() && seen.insert(hashes[*i].as_str()))
            .map(|(i, _)| (hashes[i].clone(), chunks[i].content.clone()))
            .collect();
        let embedded = pending.len();

        let fresh = embed_pending(embedder.as_ref(), pending, options).await?;

        for (slot, hash) in vectors.iter_mut().zip(&hashes) {
            if slot.is_none() {
                *slot = fresh.get(hash).cloned();
            }
        }

        if let Some(cache) = cache {
            cache.extend(fresh);
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                vector.map(|vector| Entry { chunk, vector }).ok_or_else(|| {
                    EmbeddingError::Malformed("missing vector for chunk".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(first) = entries.first() {
            let expected = first.vector.len();
            if let Some(bad) = entries.iter().find(|e| e.vector.len() != expected) {
                return Err(EmbeddingError::Dimension {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }

        debug!(
            chunks = entries.len(),
            cached,
            embedded,
            model = embedder.model_name(),
            "built vector store"
        );

        Ok(Self { entries, embedder })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of the stored vectors (`0` for an empty store).
    fn dims(&self) -> usize {
        self.entries.first().map(|e| e.vector.len()).unwrap_or(0)
    }

    /// Embed `query` and return the `k` most similar chunks.
    ///
    /// An empty store or `k == 0` returns an empty list without calling the
    /// embedder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;
        if query_vec.len() != self.dims() {
            return Err(EmbeddingError::Dimension {
                expected: self.dims(),
                actual: query_vec.len(),
            });
        }

        Ok(self.retrieve_by_vector(&query_vec, k))
    }

    /// Rank stored chunks against a precomputed query vector.
    pub fn retrieve_by_vector(&self, query_vec: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(&Entry, f32)> = self
            .entries
            .iter()
            .map(|e| (e, cosine_similarity(query_vec, &e.vector)))
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| rank_order(a, *sa, b, *sb));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(e, score)| ScoredChunk {
                chunk: e.chunk.clone(),
                score,
            })
            .collect()
    }
}

fn rank_order(a: &Entry, score_a: f32, b: &Entry, score_b: f32) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then(a.chunk.sequence_index.cmp(&b.chunk.sequence_index))
        .then_with(|| a.chunk.source_file.cmp(&b.chunk.source_file))
        .then_with(|| a.chunk.content.cmp(&b.chunk.content))
}

/// Embed `(hash, text)` pairs with bounded fan-out, keyed by hash.
async fn embed_pending(
    embedder: &dyn Embedder,
    pending: Vec<(String, String)>,
    options: BuildOptions,
) -> Result<HashMap<String, Arc<[f32]>>, EmbeddingError> {
    if pending.is_empty() {
        return Ok(HashMap::new());
    }

    let dims = embedder.dims();
    let batches: Vec<Vec<(String, String)>> = pending
        .chunks(options.batch_size.max(1))
        .map(<[(String, String)]>::to_vec)
        .collect();

    let results: Vec<Vec<(String, Arc<[f32]>)>> = stream::iter(batches)
        .map(|batch| async move {
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            let vectors = check_vectors(vectors, texts.len(), dims)?;
            Ok::<_, EmbeddingError>(
                batch
                    .into_iter()
                    .map(|(hash, _)| hash)
                    .zip(vectors.into_iter().map(Arc::<[f32]>::from))
                    .collect::<Vec<_>>(),
            )
        })
        .buffer_unordered(options.concurrency.max(1))
        .try_collect()
        .await?;

    Ok(results.into_iter().flatten().collect())
}
