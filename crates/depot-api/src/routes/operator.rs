//! # Operator Endpoints
//!
//! `GET /-/health` answers `ok` to anyone. `GET /-/status` reports uptime,
//! cache size, request counters and recent faults, and requires a token
//! scoped to the whole repository.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::faults::FaultRecord;
use crate::middleware::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Body of `GET /-/status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub uptime_seconds: u64,
    pub deploy_enabled: bool,
    pub cached_documents: usize,
    pub metrics: MetricsSnapshot,
    /// Oldest first.
    pub faults: Vec<FaultRecord>,
}

/// Build the operator router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/-/health", get(health))
        .route("/-/status", get(status))
}

/// GET /-/health
async fn health() -> &'static str {
    "ok"
}

/// GET /-/status
async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusReport>, AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let session = state
        .controller
        .authenticator()
        .authenticate_header(authorization)?;
    if !session.prefix().is_root() {
        tracing::warn!(alias = %session.alias(), "status refused: token is not root-scoped");
        return Err(AppError::Unauthorized(
            "status requires a root-scoped token".to_string(),
        ));
    }

    let cache = Arc::clone(state.controller.cache());
    let cached_documents = tokio::task::spawn_blocking(move || cache.len())
        .await
        .map_err(|e| AppError::Internal(format!("status task failed: {e}")))?;

    Ok(Json(StatusReport {
        uptime_seconds: state.uptime_seconds(),
        deploy_enabled: state.controller.deploy_enabled(),
        cached_documents,
        metrics: state.metrics.snapshot(),
        faults: state.controller.faults().recent(),
    }))
}
