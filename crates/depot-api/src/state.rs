//! # Application State
//!
//! Shared state for the Axum application, passed to handlers via the `State`
//! extractor. Everything inside is either immutable after startup or
//! synchronizes internally, so cloning the state is cheap and handlers never
//! hold a lock across an `.await`.

use std::sync::Arc;
use std::time::Instant;

use depot_auth::TokenStore;

use crate::config::DepotConfig;
use crate::controller::RepositoryController;
use crate::middleware::metrics::ApiMetrics;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<DepotConfig>,
    pub controller: Arc<RepositoryController>,
    pub metrics: ApiMetrics,
    pub started_at: Instant,
}

impl AppState {
    /// Build the state for `config`, authenticating against `tokens`.
    pub fn new(config: DepotConfig, tokens: TokenStore) -> Self {
        let controller = RepositoryController::new(&config, tokens);
        Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            metrics: ApiMetrics::new(),
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
