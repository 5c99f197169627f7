//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::{ApiResponse, request_id};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// No conversation is known for this sender.
    TrackerNotFound(String),
    /// Validation error.
    Validation(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::TrackerNotFound(sender_id) => (
                StatusCode::NOT_FOUND,
                "TRACKER_NOT_FOUND",
                format!("No tracker found for sender '{sender_id}'"),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ApiResponse::<()>::error(code, &message, request_id(), 0);
        (status, Json(body)).into_response()
    }
}
