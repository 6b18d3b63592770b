//! # depot-server: Binary Entry Point
//!
//! Loads configuration, prepares the repository root and token store, and
//! serves the Axum application until Ctrl-C.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use depot_api::config::{DepotConfig, LogFormat};
use depot_api::state::AppState;
use depot_auth::TokenStore;
use tracing_subscriber::EnvFilter;

/// depot artifact repository server.
#[derive(Parser, Debug)]
#[command(name = "depot-server", version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, env = "DEPOT_CONFIG", default_value = "depot.yaml")]
    config: PathBuf,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn count_repositories(root: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(root)? {
        if entry?.file_type()?.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = DepotConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config
        .apply_env()
        .context("applying environment overrides")?;

    init_tracing(config.log_format);
    tracing::debug!(?config, "configuration loaded");

    std::fs::create_dir_all(&config.repository_root).with_context(|| {
        format!(
            "creating repository root {}",
            config.repository_root.display()
        )
    })?;
    let repositories = count_repositories(&config.repository_root)
        .context("listing repository root")?;
    tracing::info!(
        root = %config.repository_root.display(),
        repositories,
        "repository root ready"
    );

    let tokens = TokenStore::load_or_default(&config.tokens_file)
        .with_context(|| format!("loading tokens from {}", config.tokens_file.display()))?;
    tracing::info!(tokens = tokens.len(), "token store loaded");
    if !config.deploy_enabled {
        tracing::warn!("artifact deployment is disabled");
    }

    let addr = config.bind_address();
    let state = AppState::new(config, tokens);
    let app = depot_api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("depot listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
