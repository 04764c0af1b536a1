//! Comment fetch handler.
//!
//! One call searches the community, takes the single most relevant post and
//! returns all of its comment bodies. No retries happen here; a failed
//! upstream call is reported immediately.

use std::sync::Arc;
use std::time::Duration;

use comment_relay_sdk::{Comment, ContentSource, ContentSourceError, SearchOptions};
use tracing::{debug, instrument, warn};

use super::request::{CanonicalRequest, CanonicalResult, CommentBody};

/// Failure of one comment fetch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("error searching posts: {0}")]
    UpstreamSearch(ContentSourceError),

    #[error("no posts found")]
    NoPostsFound,

    #[error("error getting comments: {0}")]
    UpstreamFetch(ContentSourceError),

    #[error("request timed out")]
    Timeout,
}

impl FetchError {
    /// Upstream cause, when the failure came from the content source.
    #[must_use]
    pub const fn upstream_cause(&self) -> Option<&ContentSourceError> {
        match self {
            Self::UpstreamSearch(cause) | Self::UpstreamFetch(cause) => Some(cause),
            Self::NoPostsFound | Self::Timeout => None,
        }
    }
}

/// Orchestrates search + fetch-with-comments against a [`ContentSource`].
pub struct FetchService {
    source: Arc<dyn ContentSource>,
    deadline: Duration,
}

impl FetchService {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, deadline: Duration) -> Self {
        Self { source, deadline }
    }

    /// Fetch the comments of the most relevant post for `req`, bounded by the
    /// configured deadline.
    ///
    /// # Errors
    /// See [`FetchError`].
    pub async fn fetch(&self, req: &CanonicalRequest) -> Result<CanonicalResult, FetchError> {
        self.fetch_within(req, None).await
    }

    /// Like [`fetch`](Self::fetch), but a caller deadline shorter than the
    /// configured one takes over. On expiry the in-flight upstream call is dropped.
    ///
    /// # Errors
    /// See [`FetchError`].
    #[instrument(
        skip(self, req),
        fields(subreddit = %req.community(), query = %req.query(), limit = req.limit())
    )]
    pub async fn fetch_within(
        &self,
        req: &CanonicalRequest,
        caller_deadline: Option<Duration>,
    ) -> Result<CanonicalResult, FetchError> {
        let deadline = caller_deadline.map_or(self.deadline, |d| d.min(self.deadline));
        if let Ok(result) = tokio::time::timeout(deadline, self.fetch_unbounded(req)).await {
            result
        } else {
            warn!(?deadline, "comment fetch exceeded deadline");
            Err(FetchError::Timeout)
        }
    }

    async fn fetch_unbounded(&self, req: &CanonicalRequest) -> Result<CanonicalResult, FetchError> {
        let posts = self
            .source
            .search_posts(
                req.query(),
                req.community(),
                SearchOptions::relevance_all_time(req.limit()),
            )
            .await
            .map_err(FetchError::UpstreamSearch)?;

        debug!(found = posts.len(), "search completed");

        let Some(post) = posts.into_iter().next() else {
            return Err(FetchError::NoPostsFound);
        };

        let full = self
            .source
            .get_post_with_comments(&post.id)
            .await
            .map_err(FetchError::UpstreamFetch)?;

        let comments = flatten_comments(&full.comments);
        debug!(post_id = %post.id, comments = comments.len(), "comments fetched");

        Ok(CanonicalResult {
            post_title: post.title,
            comments,
        })
    }
}

/// Depth-first, parent-before-replies flattening of a comment tree.
fn flatten_comments(roots: &[Comment]) -> Vec<CommentBody> {
    let mut out = Vec::new();
    let mut stack: Vec<&Comment> = roots.iter().rev().collect();
    while let Some(comment) = stack.pop() {
        out.push(CommentBody {
            body: comment.body.clone(),
        });
        stack.extend(comment.replies.iter().rev());
    }
    out
}
