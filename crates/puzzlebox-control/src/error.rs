//! Error types for the control surface.
//!
//! [`ControlError`] is converted into a JSON HTTP response of the form
//! `{"error": "...", "status": 400}` via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by control surface handlers.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The requested resource does not exist (yet).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or query was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request is valid but the puzzle cannot accept it right now.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
