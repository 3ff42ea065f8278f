//! # SyncBridge Server
//!
//! HTTP entry point for the sync bridge registry: agent registration,
//! heartbeat ingestion, and liveness reporting.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use sb_server::{app, workers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = sb_common::AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting SyncBridge server...");

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server.host: {}", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.api_port));

    // Build shared state
    let state = Arc::new(AppState::new(config));

    // Start background workers
    let worker_handles = workers::start_all(state.clone());
    tracing::info!("Background workers started");

    // Start server
    let app = app(state);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the worker timers so shutdown leaves nothing running.
    for handle in worker_handles {
        handle.abort();
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
