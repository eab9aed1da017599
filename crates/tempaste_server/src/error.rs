//! HTTP error mapping for API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tempaste_core::AppError;

/// Wrapper that renders an [`AppError`] as a JSON HTTP response.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// Status code reported for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::EmptyPayload | AppError::InvalidId(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::IdentifierCollision(_)
            | AppError::GeneratorExhausted { .. }
            | AppError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!("Internal error: {:?}", self.0);
            "Internal server error".to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
