//! Comment Relay SDK
//!
//! Everything a collaborator of the comment relay needs to link against:
//! - Content source contract (`ContentSource`) and its search options
//! - Broker contracts (`DeliveryProducer`, `CommentConsumer`) with the
//!   per-message acknowledgment channel types
//! - Shared models (`Post`, `Comment`, `CommentRecord`)
//! - Generated gRPC stubs for `reddit_implementation.RedditService`
//!
//! Concrete adapters live in the `plugins/` crates; the relay module itself
//! depends only on the traits declared here.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === CONTRACTS ===
mod api;
pub use api::{
    AckSender, CommentConsumer, ContentSource, DeliveryProducer, DeliveryReport, SearchOptions,
    record_stream,
};

// === MODELS ===
mod models;
pub use models::{Comment, CommentRecord, ConsumedRecord, DeliveryAck, OutboundRecord, Post};

// === ERRORS ===
mod errors;
pub use errors::{BrokerError, ContentSourceError};

// === GRPC PROTO STUBS ===
/// Generated protobuf types for `RedditService`
pub mod proto {
    #![allow(clippy::pedantic, reason = "generated code")]
    tonic::include_proto!("reddit_implementation");
}

pub use proto::reddit_service_client::RedditServiceClient;
pub use proto::reddit_service_server::{RedditService, RedditServiceServer};

/// Fully-qualified gRPC service name; also the path prefix of the HTTP gateway.
pub const SERVICE_NAME: &str = "reddit_implementation.RedditService";

/// Method name of the comment-fetch operation.
pub const GET_POST_COMMENTS_METHOD: &str = "GetPostComments";
