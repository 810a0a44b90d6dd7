//! Router and request handlers.
//!
//! Routes:
//! - `POST /`, `POST /git-operations` - run an operation (`type: "push"`)
//! - `POST /analyze`                  - repository details for a URL
//! - `GET  /repositories`             - tracked repositories
//! - `POST /repositories`             - register a URL
//! - `GET  /operations?limit=N`       - operation history, newest first
//! - `GET  /healthz`                  - health check
//!
//! Operation responses use the envelopes
//! `{success: true, logs, timestamp}` and
//! `{success: false, error, logs, details}`. Every route answers CORS
//! preflight requests with permissive headers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, instrument, warn};

use super::AppState;
use crate::core::types::{PushType, RecordId, UtcTimestamp};
use crate::engine::{
    Analyzer, AuditTrail, Ledger, PushError, PushOrchestrator, PushRequest, TracedError,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the axum [`Router`] with all routes and shared state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_operation))
        .route("/git-operations", post(handle_operation))
        .route("/analyze", post(handle_analyze))
        .route(
            "/repositories",
            get(handle_list_repositories).post(handle_register),
        )
        .route("/operations", get(handle_history))
        .route("/healthz", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationRequest {
    #[serde(rename = "type")]
    kind: String,
    source_repo_id: RecordId,
    target_repo_id: RecordId,
    #[serde(default)]
    push_type: PushType,
}

#[derive(Debug, Deserialize)]
struct UrlRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SuccessEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    logs: AuditTrail,
    timestamp: UtcTimestamp,
}

impl SuccessEnvelope {
    fn new(logs: AuditTrail, data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            logs,
            timestamp: UtcTimestamp::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FailureEnvelope {
    success: bool,
    error: String,
    logs: AuditTrail,
    details: Value,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /` and `POST /git-operations`
#[instrument(skip(state, body))]
async fn handle_operation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(AppError::from_rejection)?;
    if request.kind != "push" {
        return Err(AppError::bad_request(format!(
            "Invalid operation type: {}",
            request.kind
        )));
    }

    let orchestrator = PushOrchestrator::new(
        state.store.as_ref(),
        state.host.as_ref(),
        state.options.clone(),
    );
    let traced = orchestrator
        .push(&PushRequest {
            source_repo_id: request.source_repo_id,
            target_repo_id: request.target_repo_id,
            push_type: request.push_type,
        })
        .await
        .map_err(AppError::Operation)?;

    Ok(Json(SuccessEnvelope::new(traced.trail, None)).into_response())
}

/// `POST /analyze`
#[instrument(skip(state, body))]
async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(AppError::from_rejection)?;
    let analyzer = Analyzer::new(state.host.as_ref(), state.options.commit_history_depth);
    let traced = analyzer
        .analyze(&request.url)
        .await
        .map_err(AppError::Operation)?;

    let data = serde_json::to_value(&traced.value).map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(SuccessEnvelope::new(traced.trail, Some(data))).into_response())
}

/// `POST /repositories`
#[instrument(skip(state, body))]
async fn handle_register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(AppError::from_rejection)?;
    let analyzer = Analyzer::new(state.host.as_ref(), state.options.commit_history_depth);
    let traced = analyzer
        .register(state.store.as_ref(), &request.url)
        .await
        .map_err(AppError::Operation)?;

    let data = serde_json::to_value(&traced.value).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessEnvelope::new(traced.trail, Some(data))),
    )
        .into_response())
}

/// `GET /repositories`
async fn handle_list_repositories(
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let repos = state
        .store
        .list_repositories()
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(repos).into_response())
}

/// `GET /operations?limit=N`
async fn handle_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    let entries = Ledger::new(state.store.as_ref())
        .history(query.limit)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(entries).into_response())
}

/// `GET /healthz`
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "host": state.host.name(),
    }))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that map to the failure envelope.
#[derive(Debug)]
pub enum AppError {
    /// Malformed body or unknown operation type.
    BadRequest(String),
    /// An engine operation failed; carries its trail.
    Operation(TracedError<PushError>),
    /// Anything else.
    Internal(anyhow::Error),
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    fn from_rejection(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }

    fn into_parts(self) -> (StatusCode, String, AuditTrail, Value) {
        match self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                message,
                AuditTrail::new(),
                json!({ "kind": "invalid_request" }),
            ),
            AppError::Operation(TracedError { error, trail }) => {
                let status = if error.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, error.to_string(), trail, json!({ "kind": error.kind() }))
            }
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                AuditTrail::new(),
                json!({ "kind": "internal" }),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, mut logs, details) = self.into_parts();
        logs.error_with("Operation failed", json!({ "error": message }));
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        } else {
            warn!(%status, error = %message, "request rejected");
        }
        (
            status,
            Json(FailureEnvelope {
                success: false,
                error: message,
                logs,
                details,
            }),
        )
            .into_response()
    }
}
