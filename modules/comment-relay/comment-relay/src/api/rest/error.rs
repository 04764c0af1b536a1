use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::domain::{FetchError, ValidationError};

use super::dto::ErrorBody;

pub const BODY_READ_FAILED: &str = "Failed to read request body";
pub const INVALID_JSON: &str = "Invalid JSON format";

/// Error response of the JSON lane: a status code plus `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for JsonError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<FetchError> for JsonError {
    fn from(err: FetchError) -> Self {
        let status = match err {
            FetchError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FetchError::UpstreamSearch(_)
            | FetchError::NoPostsFound
            | FetchError::UpstreamFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
