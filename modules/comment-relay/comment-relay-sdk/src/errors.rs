//! Error types of the collaborator contracts.

/// Failure reported by a [`crate::ContentSource`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by upstream")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed upstream response: {0}")]
    Decode(String),
}

/// Failure reported by a broker adapter.
///
/// `Delivery` displays the broker's own text unchanged; it is what callers of
/// the publish pipeline see as the outcome detail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("failed to submit record: {0}")]
    Submit(String),

    #[error("{0}")]
    Delivery(String),

    #[error("consumer error: {0}")]
    Consume(String),

    #[error("broker client configuration error: {0}")]
    Config(String),
}
