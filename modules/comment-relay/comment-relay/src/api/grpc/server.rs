//! gRPC server implementation of `reddit_implementation.RedditService`.
//!
//! Serves both native gRPC and gRPC-Web (after the translation layer in the
//! gateway) and delegates to the same domain services as the JSON lane.

use std::sync::Arc;
use std::time::Duration;

use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use tracing::debug;

use comment_relay_sdk::proto::{
    Comment, CommentsResponse, PostRequest, PublishResponse, RedditComment,
};
use comment_relay_sdk::{CommentRecord, ContentSourceError, RedditService};

use crate::domain::{
    CanonicalRequest, CanonicalResult, FetchError, FetchService, PublishPipeline, ValidationError,
};

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// gRPC service wrapping the fetch handler and the publish pipeline.
#[derive(Clone)]
pub struct RedditServiceImpl {
    fetch: Arc<FetchService>,
    publisher: Arc<PublishPipeline>,
}

impl RedditServiceImpl {
    #[must_use]
    pub fn new(fetch: Arc<FetchService>, publisher: Arc<PublishPipeline>) -> Self {
        Self { fetch, publisher }
    }
}

#[tonic::async_trait]
impl RedditService for RedditServiceImpl {
    async fn get_post_comments(
        &self,
        request: Request<PostRequest>,
    ) -> Result<Response<CommentsResponse>, Status> {
        let deadline = caller_deadline(request.metadata());
        let req = request.into_inner();
        let canonical = CanonicalRequest::new(
            req.subreddit,
            req.search_query,
            i64::from(req.limit),
        )
        .map_err(validation_status)?;

        let result = self
            .fetch
            .fetch_within(&canonical, deadline)
            .await
            .map_err(fetch_status)?;

        Ok(Response::new(comments_response(result)))
    }

    async fn send_reddit_comment(
        &self,
        request: Request<RedditComment>,
    ) -> Result<Response<PublishResponse>, Status> {
        let deadline = caller_deadline(request.metadata());
        let record = comment_record(request.into_inner());
        let key = record.id.clone();

        let outcome = self.publisher.publish_within(Some(&key), &record, deadline).await;
        debug!(delivered = outcome.delivered, detail = %outcome.detail, "publish finished");

        Ok(Response::new(PublishResponse {
            success: outcome.delivered,
            message: outcome.detail,
        }))
    }
}

/// Deadline the caller attached as `grpc-timeout`. A malformed value is
/// ignored and the configured bound applies alone.
fn caller_deadline(metadata: &MetadataMap) -> Option<Duration> {
    let raw = metadata.get(GRPC_TIMEOUT_HEADER)?.to_str().ok()?;
    parse_grpc_timeout(raw)
}

/// `TimeoutValue TimeoutUnit`: at most 8 ASCII digits followed by one of
/// `H M S m u n`.
fn parse_grpc_timeout(raw: &str) -> Option<Duration> {
    let unit = raw.chars().last()?;
    let digits = raw.strip_suffix(unit)?;
    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    match unit {
        'H' => Some(Duration::from_secs(value * 3600)),
        'M' => Some(Duration::from_secs(value * 60)),
        'S' => Some(Duration::from_secs(value)),
        'm' => Some(Duration::from_millis(value)),
        'u' => Some(Duration::from_micros(value)),
        'n' => Some(Duration::from_nanos(value)),
        _ => None,
    }
}

fn comments_response(result: CanonicalResult) -> CommentsResponse {
    CommentsResponse {
        post_title: result.post_title,
        comments: result
            .comments
            .into_iter()
            .map(|c| Comment { body: c.body })
            .collect(),
    }
}

fn comment_record(msg: RedditComment) -> CommentRecord {
    CommentRecord {
        id: msg.id,
        post_id: msg.post_id,
        subreddit: msg.subreddit,
        author: msg.author,
        body: msg.body,
        score: msg.score,
        created_utc: msg.created_utc,
        permalink: msg.permalink,
    }
}

fn validation_status(err: ValidationError) -> Status {
    Status::invalid_argument(err.to_string())
}

/// Map a fetch failure onto the gRPC status space.
#[must_use]
pub fn fetch_status(err: FetchError) -> Status {
    let message = err.to_string();
    match err {
        FetchError::NoPostsFound => Status::not_found(message),
        FetchError::Timeout => Status::deadline_exceeded(message),
        FetchError::UpstreamSearch(ContentSourceError::RateLimited { .. })
        | FetchError::UpstreamFetch(ContentSourceError::RateLimited { .. }) => {
            Status::resource_exhausted(message)
        }
        FetchError::UpstreamSearch(_) | FetchError::UpstreamFetch(_) => Status::unavailable(message),
    }
}
