//! JSON shapes of the fallback lane.
//!
//! Field names follow the camelCase convention of browser callers; the values
//! are the canonical request/result fields renamed, never reformatted.

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalRequest, CanonicalResult};

/// Request document: `{"subreddit": "...", "searchQuery": "...", "limit": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentsRequest {
    pub subreddit: String,
    pub search_query: String,
    pub limit: i64,
}

impl From<&CanonicalRequest> for PostCommentsRequest {
    fn from(req: &CanonicalRequest) -> Self {
        Self {
            subreddit: req.community().to_owned(),
            search_query: req.query().to_owned(),
            limit: i64::from(req.limit()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDto {
    pub body: String,
}

/// Response document: `{"postTitle": "...", "comments": [{"body": "..."}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponseDto {
    pub post_title: String,
    pub comments: Vec<CommentDto>,
}

impl From<CanonicalResult> for CommentsResponseDto {
    fn from(result: CanonicalResult) -> Self {
        Self {
            post_title: result.post_title,
            comments: result
                .comments
                .into_iter()
                .map(|c| CommentDto { body: c.body })
                .collect(),
        }
    }
}

/// Error document: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
