//! Models shared between the relay and its adapters.

use serde::{Deserialize, Serialize};

/// A post as returned by the content source.
///
/// Search results carry an empty `comments` list; `get_post_with_comments`
/// fills it with the top-level comments, each holding its replies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub author: String,
    pub permalink: String,
    pub num_comments: u64,
    pub comments: Vec<Comment>,
}

/// One comment and the replies nested under it, in upstream order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub replies: Vec<Comment>,
}

/// Comment record published to the broker topic as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub subreddit: String,
    pub author: String,
    pub body: String,
    pub score: i32,
    pub created_utc: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub permalink: String,
}

/// Payload handed to a [`crate::DeliveryProducer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

/// Broker confirmation that a record was durably accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryAck {
    pub partition: i32,
    pub offset: i64,
}

/// Record read back from a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}
