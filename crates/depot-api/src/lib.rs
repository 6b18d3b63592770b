//! # depot-api: HTTP Service for the depot Repository
//!
//! Assembles the repository controller and the operator endpoints into one
//! Axum application.
//!
//! ## API Surface
//!
//! | Path          | Methods         | Module                      |
//! |---------------|-----------------|-----------------------------|
//! | `/-/health`   | GET             | [`routes::operator`]        |
//! | `/-/status`   | GET (root token)| [`routes::operator`]        |
//! | anything else | GET, HEAD, PUT  | [`controller`] via [`routes::repository`] |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → DefaultBodyLimit → Handler
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod faults;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(routes::operator::router())
        .fallback(routes::repository::serve)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics))
        .with_state(state)
}
