//! # doc-summarizer core
//!
//! Runtime-agnostic logic for doc-summarizer: data models, the overlapping
//! chunker, the embedding trait and cache, the request-scoped vector store,
//! and the typed rephrase → retrieve → generate answer pipeline.
//!
//! This crate contains no tokio, filesystem I/O, or HTTP clients. Backends
//! for [`embedding::Embedder`] and [`pipeline::ChatModel`] are supplied by
//! the `doc-summarizer` application crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
