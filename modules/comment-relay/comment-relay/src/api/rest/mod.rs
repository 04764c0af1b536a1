//! JSON fallback lane: one endpoint mirroring `GetPostComments` for callers
//! without a gRPC client.

pub mod dto;
pub mod error;
pub mod handlers;

pub use handlers::{canonical_to_json, get_post_comments, json_to_canonical};
