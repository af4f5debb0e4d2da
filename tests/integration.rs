//! End-to-end tests for listing documents and answering questions.

mod common;

use std::fs;
use std::sync::Arc;

use common::{BagOfWords, EchoChat, FailingChat, WrongDims};
use doc_summarizer::service::{DocService, ServiceError};
use doc_summarizer_core::error::{EmbeddingError, PipelineError};
use tempfile::TempDir;

fn sky_and_water() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "The sky is blue.").unwrap();
    fs::write(tmp.path().join("b.txt"), "Water boils at 100C.").unwrap();
    tmp
}

fn echo_service(tmp: &TempDir) -> (DocService, Arc<BagOfWords>, Arc<EchoChat>) {
    let embedder = Arc::new(BagOfWords::new());
    let chat = Arc::new(EchoChat::new());
    let service = common::service(tmp.path(), embedder.clone(), chat.clone());
    (service, embedder, chat)
}

#[tokio::test]
async fn test_list_documents_sorted_once_each() {
    let tmp = TempDir::new().unwrap();
    for name in ["zeta.txt", "alpha.txt", "Mid.TXT", "skip.md", "beta.txt"] {
        fs::write(tmp.path().join(name), "content").unwrap();
    }
    let (service, _, _) = echo_service(&tmp);

    let list = service.list_documents().await.unwrap();
    assert_eq!(
        list.file_names,
        vec!["Mid.TXT", "alpha.txt", "beta.txt", "zeta.txt"]
    );
}

#[tokio::test]
async fn test_answer_from_relevant_file() {
    let tmp = sky_and_water();
    let (service, _, chat) = echo_service(&tmp);

    let response = service
        .answer("What color is the sky?", &["a.txt", "b.txt"])
        .await
        .unwrap();

    assert_eq!(response.standalone_question, "What color is the sky?");
    assert!(response.answer.contains("The sky is blue."));
    assert_eq!(response.sources[0].source_file, "a.txt");
    assert_eq!(response.sources.len(), 2);
    assert!(response.sources[0].score > response.sources[1].score);

    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    let context = common::context_of(&calls[1].0);
    assert!(context.starts_with("<doc>\nThe sky is blue.\n</doc>"));
}

#[tokio::test]
async fn test_answer_only_uses_selected_files() {
    let tmp = sky_and_water();
    let (service, _, _) = echo_service(&tmp);

    let response = service
        .answer("What color is the sky?", &["b.txt"])
        .await
        .unwrap();

    assert!(response.sources.iter().all(|s| s.source_file == "b.txt"));
    assert!(!response.answer.contains("sky is blue"));
}

#[tokio::test]
async fn test_unknown_file_contributes_nothing() {
    let tmp = sky_and_water();
    let (service, _, _) = echo_service(&tmp);

    let response = service
        .answer("What color is the sky?", &["missing.txt", "a.txt"])
        .await
        .unwrap();

    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].source_file, "a.txt");
}

#[tokio::test]
async fn test_zero_selected_files_answers_without_context() {
    let tmp = sky_and_water();
    let (service, embedder, chat) = echo_service(&tmp);

    let no_files: [&str; 0] = [];
    let response = service.answer("What color is the sky?", &no_files).await.unwrap();

    assert!(response.sources.is_empty());
    assert_eq!(response.answer, "No sources were provided.");
    assert_eq!(embedder.embedded(), 0);
    assert_eq!(common::context_of(&chat.calls()[1].0), "");
}

#[tokio::test]
async fn test_empty_question_is_bad_request() {
    let tmp = sky_and_water();
    let (service, _, chat) = echo_service(&tmp);

    let err = service.answer("   ", &["a.txt"]).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
    assert_eq!(err.kind(), "bad_request");
    assert!(chat.calls().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_reported() {
    let tmp = sky_and_water();
    let service = common::service(
        tmp.path(),
        Arc::new(BagOfWords::new()),
        Arc::new(FailingChat),
    );

    let err = service
        .answer("What color is the sky?", &["a.txt"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "generation_error");
}

#[tokio::test]
async fn test_dimension_mismatch_fails_request() {
    let tmp = sky_and_water();
    let service = common::service(tmp.path(), Arc::new(WrongDims), Arc::new(EchoChat::new()));

    let err = service
        .answer("What color is the sky?", &["a.txt"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "embedding_error");
    assert!(matches!(
        err,
        ServiceError::Pipeline(PipelineError::Embedding(EmbeddingError::Dimension { .. }))
    ));
}

#[tokio::test]
async fn test_cache_reused_across_requests() {
    let tmp = sky_and_water();
    let (service, embedder, _) = echo_service(&tmp);

    service.answer("What color is the sky?", &["a.txt", "b.txt"]).await.unwrap();
    // two chunks plus the query
    assert_eq!(embedder.embedded(), 3);

    service.answer("Why is the sky blue?", &["a.txt", "b.txt"]).await.unwrap();
    // only the new query
    assert_eq!(embedder.embedded(), 4);
}

#[tokio::test]
async fn test_cache_disabled_reembeds() {
    let tmp = sky_and_water();
    let embedder = Arc::new(BagOfWords::new());
    let mut config = common::config_for(tmp.path());
    config.embedding.cache = false;
    let service = DocService::new(config, embedder.clone(), Arc::new(EchoChat::new()));

    service.answer("sky?", &["a.txt"]).await.unwrap();
    service.answer("sky?", &["a.txt"]).await.unwrap();
    assert_eq!(embedder.embedded(), 4);
}

#[tokio::test]
async fn test_new_files_visible_without_restart() {
    let tmp = sky_and_water();
    let (service, _, _) = echo_service(&tmp);
    assert_eq!(service.list_documents().await.unwrap().file_names.len(), 2);

    fs::write(tmp.path().join("c.txt"), "Cats sleep a lot.").unwrap();
    let list = service.list_documents().await.unwrap();
    assert_eq!(list.file_names, vec!["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn test_missing_folder_is_load_error() {
    let tmp = TempDir::new().unwrap();
    let service = common::service(
        &tmp.path().join("nope"),
        Arc::new(BagOfWords::new()),
        Arc::new(EchoChat::new()),
    );
    let err = service.list_documents().await.unwrap_err();
    assert_eq!(err.kind(), "load_error");
}

#[tokio::test]
async fn test_long_document_retrieves_matching_chunk() {
    let tmp = TempDir::new().unwrap();
    let filler = "Lorem ipsum dolor sit amet consectetur. ".repeat(80);
    let text = format!("{}The secret ingredient is saffron. {}", filler, filler);
    fs::write(tmp.path().join("long.txt"), &text).unwrap();

    let embedder = Arc::new(BagOfWords::new());
    let chat = Arc::new(EchoChat::new());
    let mut config = common::config_for(tmp.path());
    config.chunking.chunk_size = 200;
    config.chunking.chunk_overlap = 20;
    config.retrieval.k = 1;
    let service = DocService::new(config, embedder, chat);

    let response = service
        .answer("What is the secret ingredient?", &["long.txt"])
        .await
        .unwrap();
    assert_eq!(response.sources.len(), 1);
    assert!(response.answer.contains("saffron"));
}
