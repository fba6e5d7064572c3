//! HTTP API handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub mod execute;
pub mod health;
pub mod template;

/// Error body returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

/// Build an error response. Messages are user-facing; internal detail stays
/// in the logs.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
}
