use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdf_swap::{ErrorKind, SwapError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used whenever the real cause must not reach the client
pub const GENERIC_MESSAGE: &str = "Internal server error";

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub message: String,
}

/// Application-specific error types for the API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Validation, location and assembly failures from the core
    #[error(transparent)]
    Swap(#[from] SwapError),
    /// The multipart body could not be read
    #[error("Malformed multipart request ({0})")]
    Multipart(String),
    /// Working area I/O (acquire, stage, store, release)
    #[error("working area I/O failed: {0}")]
    WorkingArea(#[from] std::io::Error),
    /// The blocking swap task panicked or was aborted
    #[error("swap task failed: {0}")]
    Task(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Swap(e) if e.kind() == ErrorKind::Client => StatusCode::BAD_REQUEST,
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Swap(SwapError::Cancelled) => GENERIC_MESSAGE.to_string(),
            ApiError::Swap(e) => e.message().to_string(),
            ApiError::Multipart(_) => self.to_string(),
            ApiError::WorkingArea(_) | ApiError::Task(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }

        let error_response = ErrorResponse {
            message: self.client_message(),
        };

        (status, Json(error_response)).into_response()
    }
}
