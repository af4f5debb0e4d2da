//! HTTP server.
//!
//! Exposes [`DocService`] as a small JSON API for browser front-ends.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/files` | Names of the documents available for selection |
//! | `POST` | `/ask` | Answer a question from the selected documents |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `chunk_error` (400), `load_error` (500),
//! `internal_error` (500), `embedding_error` (502), `generation_error` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::service::{AnswerResponse, DocService, FileList, ServiceError};

/// Build the application router.
pub fn router(service: Arc<DocService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/files", get(handle_files))
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(service)
}

/// Serve on `[server].bind` until the process is terminated.
pub async fn run_server(service: Arc<DocService>) -> anyhow::Result<()> {
    let bind_addr = service.config().server.bind.clone();
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::InvalidRequest(_) | ServiceError::Chunk(_) => StatusCode::BAD_REQUEST,
            ServiceError::Pipeline(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Load(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status != StatusCode::BAD_REQUEST {
            warn!(code = err.kind(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /files ============

async fn handle_files(State(service): State<Arc<DocService>>) -> Result<Json<FileList>, AppError> {
    Ok(Json(service.list_documents().await?))
}

// ============ POST /ask ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest {
    question: String,
    #[serde(default)]
    selected_files: Vec<String>,
}

async fn handle_ask(
    State(service): State<Arc<DocService>>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    let response = service.answer(&req.question, &req.selected_files).await?;
    Ok(Json(response))
}
