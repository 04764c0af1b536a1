//! Transport-agnostic request and result of the comment fetch operation.

/// Why an inbound request could not become a [`CanonicalRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("{0} must be a non-empty string")]
    EmptyField(&'static str),

    #[error("limit must be a positive integer")]
    InvalidLimit,
}

/// Validated `{community, query, limit}` triple consumed by the fetch handler.
///
/// Only constructible through [`CanonicalRequest::new`], so every instance has
/// a non-blank community and query and a limit of at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    community: String,
    query: String,
    limit: u32,
}

impl CanonicalRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    /// Returns [`ValidationError`] when a string is blank or `limit` is not in `1..=u32::MAX`.
    pub fn new(
        community: impl Into<String>,
        query: impl Into<String>,
        limit: i64,
    ) -> Result<Self, ValidationError> {
        let community = community.into();
        if community.trim().is_empty() {
            return Err(ValidationError::EmptyField("subreddit"));
        }
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyField("searchQuery"));
        }
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or(ValidationError::InvalidLimit)?;

        Ok(Self {
            community,
            query,
            limit,
        })
    }

    #[must_use]
    pub fn community(&self) -> &str {
        &self.community
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of posts searched. Does not bound the number of comments returned.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

/// Body of one comment in a [`CanonicalResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody {
    pub body: String,
}

/// Title of the most relevant post and all of its comments in upstream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResult {
    pub post_title: String,
    pub comments: Vec<CommentBody>,
}
