//! Handler error type with a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or unknown query parameter (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Nothing to return for the request (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected failure while building a response (500).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Internal(msg) => msg,
        };
        if status.is_server_error() {
            tracing::error!(%message, "request failed");
        }

        let body = axum::Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
