//! JSON fallback handler for `GetPostComments`.

use axum::Json;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{CanonicalRequest, CanonicalResult, FetchService, ValidationError};

use super::dto::CommentsResponseDto;
use super::error::{BODY_READ_FAILED, INVALID_JSON, JsonError};

/// Validate a decoded JSON document into a [`CanonicalRequest`].
///
/// # Errors
/// Returns [`ValidationError`] when the document is not an object, a field is
/// missing, a string is blank or `limit` is not a positive integer.
pub fn json_to_canonical(doc: &Value) -> Result<CanonicalRequest, ValidationError> {
    let obj = doc.as_object().ok_or(ValidationError::NotAnObject)?;

    let subreddit = text_field(obj, "subreddit")?;
    let search_query = text_field(obj, "searchQuery")?;
    let limit = obj
        .get("limit")
        .ok_or(ValidationError::MissingField("limit"))?
        .as_i64()
        .ok_or(ValidationError::InvalidLimit)?;

    CanonicalRequest::new(subreddit, search_query, limit)
}

fn text_field<'a>(
    obj: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ValidationError> {
    obj.get(name)
        .ok_or(ValidationError::MissingField(name))?
        .as_str()
        .ok_or(ValidationError::EmptyField(name))
}

/// Render a [`CanonicalResult`] as the JSON response document.
#[must_use]
pub fn canonical_to_json(result: CanonicalResult) -> CommentsResponseDto {
    CommentsResponseDto::from(result)
}

/// Serve one JSON-lane exchange end to end. Every outcome is a JSON document.
pub async fn get_post_comments(fetch: &FetchService, body: Body, body_limit: usize) -> Response {
    match handle(fetch, body, body_limit).await {
        Ok(dto) => Json(dto).into_response(),
        Err(err) => {
            debug!(status = %err.status, error = %err.message, "json request failed");
            err.into_response()
        }
    }
}

async fn handle(
    fetch: &FetchService,
    body: Body,
    body_limit: usize,
) -> Result<CommentsResponseDto, JsonError> {
    let bytes = axum::body::to_bytes(body, body_limit).await.map_err(|e| {
        warn!(error = %e, "failed to read json request body");
        JsonError::bad_request(BODY_READ_FAILED)
    })?;

    let doc: Value =
        serde_json::from_slice(&bytes).map_err(|_| JsonError::bad_request(INVALID_JSON))?;

    let req = json_to_canonical(&doc)?;
    let result = fetch.fetch(&req).await?;

    Ok(canonical_to_json(result))
}
