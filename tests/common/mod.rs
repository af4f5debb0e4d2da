//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use doc_summarizer::config::Config;
use doc_summarizer::service::DocService;
use doc_summarizer_core::embedding::Embedder;
use doc_summarizer_core::error::{EmbeddingError, GenerationError};
use doc_summarizer_core::pipeline::{ChatModel, REPHRASE_SYSTEM_PROMPT};

pub const BUCKETS: usize = 256;

/// Bag-of-words embedder: each lowercase word increments one FNV-hashed bucket.
pub struct BagOfWords {
    pub texts_embedded: AtomicUsize,
}

impl BagOfWords {
    pub fn new() -> Self {
        Self {
            texts_embedded: AtomicUsize::new(0),
        }
    }

    pub fn embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325u64, |h, b| {
        (h ^ b as u64).wrapping_mul(0x100000001b3)
    })
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; BUCKETS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let bucket = (fnv1a(&word.to_lowercase()) % BUCKETS as u64) as usize;
        v[bucket] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for BagOfWords {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }
    fn dims(&self) -> usize {
        BUCKETS
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }
}

/// Embedder that returns vectors shorter than it advertises.
pub struct WrongDims;

#[async_trait]
impl Embedder for WrongDims {
    fn model_name(&self) -> &str {
        "wrong-dims"
    }
    fn dims(&self) -> usize {
        BUCKETS
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
    }
}

/// Chat model that rephrases by echoing the question and answers by echoing
/// the retrieved context.
pub struct EchoChat {
    pub calls: Mutex<Vec<(String, String)>>,
}

impl EchoChat {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

/// Text between `<context>` and `</context>` in an answer system prompt.
pub fn context_of(system: &str) -> String {
    let start = system.find("<context>\n").map(|i| i + "<context>\n".len());
    let end = system.rfind("\n</context>");
    match (start, end) {
        (Some(s), Some(e)) if s <= e => system[s..e].to_string(),
        _ => String::new(),
    }
}

#[async_trait]
impl ChatModel for EchoChat {
    fn model_name(&self) -> &str {
        "echo"
    }
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        if system == REPHRASE_SYSTEM_PROMPT {
            let question = user.split_once('\n').map(|(_, q)| q).unwrap_or(user);
            return Ok(question.to_string());
        }

        let context = context_of(system);
        if context.is_empty() {
            Ok("No sources were provided.".to_string())
        } else {
            Ok(format!("From the sources: {}", context))
        }
    }
}

/// Chat model that always fails.
pub struct FailingChat;

#[async_trait]
impl ChatModel for FailingChat {
    fn model_name(&self) -> &str {
        "failing"
    }
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

pub fn config_for(folder: &Path) -> Config {
    let mut config = Config::default();
    config.docs.folder = folder.to_path_buf();
    config
}

pub fn service(folder: &Path, embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>) -> DocService {
    DocService::new(config_for(folder), embedder, chat)
}

/// Minimal valid PDF with one page showing `phrase`. Body first, then an
/// xref with correct byte offsets so pdf-extract can parse it.
pub fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}
