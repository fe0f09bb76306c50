//! HTTP boundary for the match pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/match` | Suggest matches for `{targetItem, candidates}` |
//! | `GET`  | `/health` | Health check (returns version and model) |
//!
//! # Error Contract
//!
//! Successful responses are a JSON array of suggestions; `[]` means "no
//! matches" and is not an error. Errors carry a non-2xx status and a body
//! of the form:
//!
//! ```json
//! { "error": "targetItem and candidates are required" }
//! ```
//!
//! | Status | Cause |
//! |--------|-------|
//! | 400 | Body is not JSON, `targetItem` missing, `candidates` not a list |
//! | 500 | Model credential missing or provider disabled |
//!
//! Model service failures never surface here: the pipeline answers `[]`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front end
//! served from another origin can call the API.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::MatchError;
use crate::models::{MatchRequest, MatchSuggestion};
use crate::pipeline::MatchPipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<MatchPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<MatchPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Starts the HTTP server with the requester selected by `[llm]`.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = MatchPipeline::from_config(config)?;
    let bind_addr = config.server.bind.clone();
    let model = pipeline.model_name().to_string();
    let app = router(AppState::new(Arc::new(pipeline)));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, model = %model, "match server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Exposed so callers can serve it on their own listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/match", post(handle_match))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        let status = match &err {
            MatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MatchError::MissingCredential { .. } | MatchError::ProviderDisabled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            MatchError::Transport(_) | MatchError::Status { .. } => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "match request failed");
        }
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    model: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.pipeline.model_name().to_string(),
    })
}

// ============ POST /api/match ============

/// Handler for `POST /api/match`.
///
/// The credential is resolved once, before the body is even parsed, so a
/// misconfigured deployment always answers 500 regardless of input.
async fn handle_match(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<MatchSuggestion>>, AppError> {
    let credential = state.pipeline.credential()?;

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|_| bad_request("Invalid JSON payload"))?;
    let request = MatchRequest::from_value(payload)?;

    let matches = state
        .pipeline
        .find_matches_with(&credential, &request.target_item, &request.candidates)
        .await?;

    tracing::debug!(
        target_id = %request.target_item.id,
        candidates = request.candidates.len(),
        suggestions = matches.len(),
        "match request served"
    );

    Ok(Json(matches))
}
