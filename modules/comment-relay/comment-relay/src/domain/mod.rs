//! Domain layer of the comment relay.
//!
//! Transport-agnostic request/result types, the comment fetch handler and the
//! publish pipeline.

pub mod fetch;
pub mod publish;
pub mod request;

pub use fetch::{FetchError, FetchService};
pub use publish::{DeliveryOutcome, PublishPipeline};
pub use request::{CanonicalRequest, CanonicalResult, CommentBody, ValidationError};
