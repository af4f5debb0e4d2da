//! # doc-summarizer
//!
//! Ask questions about a folder of `.txt` and `.pdf` documents.
//!
//! Each question is answered from the documents the caller selects: their
//! chunks are embedded into a request-scoped vector store, the question is
//! rephrased into a standalone question, the closest chunks are retrieved,
//! and a chat model answers from that context only.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌──────────────┐
//! │  Loader  │──▶│ Chunker │──▶│ CorpusIndex│──▶│ VectorStore  │
//! │ txt/pdf  │   │         │   │  by file   │   │ (per request)│
//! └──────────┘   └─────────┘   └────────────┘   └──────┬───────┘
//!                                                      ▼
//!                               rephrase ──▶ retrieve ──▶ generate
//!                                                      │
//!                                   ┌──────────────────┤
//!                                   ▼                  ▼
//!                              ┌──────────┐       ┌──────────┐
//!                              │   CLI    │       │   HTTP   │
//!                              │ (docsum) │       │  (axum)  │
//!                              └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docsum files                                  # list documents in ./docs
//! docsum ask "What is this about?" --file a.txt
//! docsum serve                                  # GET /files, POST /ask
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF and text extraction |
//! | [`loader`] | Document folder scanning |
//! | [`corpus`] | Chunk catalog keyed by file |
//! | [`embedding`] | OpenAI / Ollama embedders |
//! | [`llm`] | OpenAI / Ollama chat models |
//! | [`service`] | List and answer operations |
//! | [`server`] | HTTP server |

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod extract;
mod http;
pub mod llm;
pub mod loader;
pub mod server;
pub mod service;
