//! HTTP retrieval API.
//!
//! Exposes the `retrieve(query, k)` contract to the conversational front-end
//! and answer-generation components, which run as separate processes. The
//! [`RetrievalService`] is initialized once and shared read-only across all
//! handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/retrieve` | Top-K fragments for `{ "query": "...", "k": 3 }` |
//! | `GET`  | `/stats` | Fragment count and index dimensionality |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use legal_context_core::index::NearestNeighborIndex;
use legal_context_core::models::RankedFragment;

use crate::config::Config;
use crate::error::RetrievalError;
use crate::service::RetrievalService;

/// Shared state handed to every route handler.
#[derive(Clone)]
struct AppState {
    service: Arc<RetrievalService>,
}

/// Initialize the retrieval service and serve until the process exits.
///
/// Binds to `[server].bind`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let cfg = config.clone();
    let service = tokio::task::spawn_blocking(move || RetrievalService::initialize(&cfg)).await??;
    serve(config, Arc::new(service)).await
}

/// Serve an already-initialized service.
pub async fn serve(config: &Config, service: Arc<RetrievalService>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(service);

    tracing::info!(bind = %bind_addr, "retrieval server listening");
    println!("Retrieval server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router for `service`.
pub fn router(service: Arc<RetrievalService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/retrieve", post(handle_retrieve))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service })
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

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::InvalidArgument(msg) => bad_request(msg),
            other => internal(other.to_string()),
        }
    }
}

// ============ POST /retrieve ============

#[derive(Deserialize)]
struct RetrieveRequest {
    query: String,
    /// Defaults to `[retrieval].top_k`.
    #[serde(default)]
    k: Option<usize>,
}

#[derive(Serialize)]
struct RetrieveResponse {
    fragments: Vec<RankedFragment>,
}

/// Handler for `POST /retrieve`.
///
/// Returns `400` for an empty query or `k == 0`. An empty corpus returns
/// `200` with no fragments.
async fn handle_retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let k = req.k.unwrap_or(state.service.default_k());

    let service = state.service.clone();
    let fragments = tokio::task::spawn_blocking(move || service.retrieve_ranked(&req.query, k))
        .await
        .map_err(|e| internal(e.to_string()))??;

    Ok(Json(RetrieveResponse { fragments }))
}

// ============ GET /stats ============

#[derive(Serialize)]
struct StatsResponse {
    fragments: usize,
    dimensions: usize,
    documents: usize,
    fragment_size: usize,
    built_at: String,
}

async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let service = &state.service;
    let info = service.info();
    Json(StatsResponse {
        fragments: service.fragments().len(),
        dimensions: service.index().dims(),
        documents: info.document_count,
        fragment_size: info.fragment_size,
        built_at: info.built_at.to_rfc3339(),
    })
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
