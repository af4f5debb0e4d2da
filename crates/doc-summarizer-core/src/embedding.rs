//! Embedding trait, vector utilities, and the shared embedding cache.
//!
//! Concrete [`Embedder`] backends (OpenAI, Ollama) live in the
//! `doc-summarizer` app crate.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::EmbeddingError;

/// Trait for embedding backends.
///
/// Implementations return one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the expected vector dimensionality, or `0` when unknown.
    fn dims(&self) -> usize;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        let mut vectors = check_vectors(vectors, 1, self.dims())?;
        Ok(vectors.remove(0))
    }
}

/// Validate a backend response: exact count, consistent dimensionality,
/// finite components.
///
/// `dims == 0` means the dimensionality is taken from the first vector.
pub fn check_vectors(
    vectors: Vec<Vec<f32>>,
    expected_count: usize,
    dims: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::Malformed(format!(
            "expected {} vectors, got {}",
            expected_count,
            vectors.len()
        )));
    }

    let expected = if dims > 0 {
        dims
    } else {
        vectors.first().map(Vec::len).unwrap_or(0)
    };

    for v in &vectors {
        if v.is_empty() {
            return Err(EmbeddingError::Malformed("empty vector".to_string()));
        }
        if v.len() != expected {
            return Err(EmbeddingError::Dimension {
                expected,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::Malformed(
                "vector contains non-finite values".to_string(),
            ));
        }
    }

    Ok(vectors)
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// SHA-256 hex digest of a chunk's text, the embedding cache key.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

type Snapshot = Arc<HashMap<String, Arc<[f32]>>>;

/// Content-addressed embedding cache shared across requests.
///
/// Readers take an immutable snapshot; inserts copy the current map, add the
/// new entries and swap the snapshot in. The lock is only held long enough
/// to clone or replace the `Arc`, never across an embedding call.
///
/// Entries are never evicted. Editing a file leaves the vectors of its old
/// chunks behind, so the cache grows with every distinct chunk text seen
/// over the life of the service. Disable it with `[embedding] cache = false`
/// for long-running servers over frequently rewritten folders.
#[derive(Default)]
pub struct EmbeddingCache {
    snapshot: RwLock<Snapshot>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current immutable view of the cache.
    pub fn snapshot(&self) -> Snapshot {
        let guard = self
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    pub fn get(&self, hash: &str) -> Option<Arc<[f32]>> {
        self.snapshot().get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish a new snapshot containing `entries` in addition to the current ones.
    pub fn extend(&self, entries: impl IntoIterator<Item = (String, Arc<[f32]>)>) {
        let entries: Vec<(String, Arc<[f32]>)> = entries.into_iter().collect();
        if entries.is_empty() {
            return;
        }
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next: HashMap<String, Arc<[f32]>> = (**guard).clone();
        next.extend(entries);
        *guard = Arc::new(next);
    }
}
