//! Comment Relay Module
//!
//! Fetches the comments of the most relevant post for a subreddit search and
//! publishes comment records to a broker topic with per-message confirmation.
//!
//! ## Architecture
//!
//! - `domain/` - canonical request/result, comment fetch handler, publish pipeline
//! - `api/grpc/` - `RedditService` implementation over the domain services
//! - `api/rest/` - JSON fallback for `GetPostComments`
//! - `gateway/` - lane classification, CORS and the single-listener router
//!
//! Concrete content source and broker adapters are injected as
//! `comment-relay-sdk` trait objects; see the `plugins/` crates.

pub mod config;
pub use config::{CorsConfig, GatewayConfig};

pub mod gateway;
pub use gateway::Gateway;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
