//! API routes module.

mod health;
mod sync;

use crate::AppState;
use axum::Router;
use sb_common::AppError;
use std::sync::Arc;

/// Build the API router with all sub-routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(sync::router(state))
        .merge(health::router())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}
