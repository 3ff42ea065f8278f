//! # sb-common
//!
//! Shared configuration and error types for the sync bridge.

pub mod config;
pub mod error;

pub use config::{AppConfig, ServerConfig, SyncConfig};
pub use error::{AppError, AppResult};
