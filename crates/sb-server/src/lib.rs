//! # SyncBridge Server
//!
//! Cloud-side registry for on-premises sync agents: registration,
//! heartbeat ingestion, and liveness reporting over a small HTTP API.

pub mod api;
pub mod sync;
pub mod workers;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::sync::clock::SystemClock;
use crate::sync::SyncRegistry;
use sb_common::AppConfig;

/// Shared application state available to all handlers and workers.
pub struct AppState {
    pub config: AppConfig,
    pub registry: SyncRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let registry = SyncRegistry::new(Arc::new(SystemClock), &config.sync);
        Self { config, registry }
    }
}

/// Build the full application router, middleware included.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
