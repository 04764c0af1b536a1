//! Reddit Content Source Plugin
//!
//! Implements the comment relay's `ContentSource` contract against the Reddit
//! JSON API:
//!
//! - OAuth password grant (script app credentials), token cached until shortly
//!   before expiry and dropped on `401`
//! - `GET /r/{subreddit}/search` restricted to the subreddit
//! - `GET /comments/{id}` parsed into a comment tree, `more` stubs skipped
//!
//! HTTP `429` maps to `ContentSourceError::RateLimited`; nothing is retried here.

pub mod config;
pub use config::{RedditConfig, RedditConfigError, RedditCredentials};

pub mod client;
pub use client::RedditClient;

mod listing;
