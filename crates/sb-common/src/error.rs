use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Convenient Result alias.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Error bodies follow the bridge's `{success, message}` wire convention
/// rather than a nested error envelope, so agents parse success and failure
/// responses with the same shape.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
