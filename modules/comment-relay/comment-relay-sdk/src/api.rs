//! Contract traits for the relay's external collaborators.

use async_trait::async_trait;
use futures::stream::{self, Stream};
use tokio::sync::oneshot;

use crate::errors::{BrokerError, ContentSourceError};
use crate::models::{ConsumedRecord, DeliveryAck, OutboundRecord, Post};

/// Options for [`ContentSource::search_posts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of posts returned by the search.
    pub limit: u32,
}

impl SearchOptions {
    /// Relevance-sorted search over all time, the only mode the relay issues.
    /// Adapters translate this into their own sort and time-window parameters.
    #[must_use]
    pub const fn relevance_all_time(limit: u32) -> Self {
        Self { limit }
    }
}

/// Upstream content provider (Reddit in production).
///
/// Implementations are shared across all concurrent requests and must not
/// retry on their own behalf unless that is part of their documented policy.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Search `community` for posts matching `query`.
    ///
    /// # Errors
    /// Returns a [`ContentSourceError`] when the upstream call fails or answers malformed data.
    async fn search_posts(
        &self,
        query: &str,
        community: &str,
        options: SearchOptions,
    ) -> Result<Vec<Post>, ContentSourceError>;

    /// Fetch a post together with its comment tree.
    ///
    /// # Errors
    /// Returns [`ContentSourceError::NotFound`] for unknown posts, other variants as for search.
    async fn get_post_with_comments(&self, post_id: &str) -> Result<Post, ContentSourceError>;
}

/// Single event delivered on a per-message acknowledgment channel.
pub type DeliveryReport = Result<DeliveryAck, BrokerError>;

/// Sending half of a per-message acknowledgment channel.
pub type AckSender = oneshot::Sender<DeliveryReport>;

/// Broker producer that reports delivery through a caller-owned one-shot channel.
///
/// `submit` must either return an error (nothing was enqueued, the sender is
/// dropped) or eventually send exactly one [`DeliveryReport`] on `ack`.
pub trait DeliveryProducer: Send + Sync {
    /// Enqueue `record` for delivery.
    ///
    /// # Errors
    /// Returns [`BrokerError::Submit`] when the record could not be enqueued.
    fn submit(&self, record: OutboundRecord, ack: AckSender) -> Result<(), BrokerError>;
}

/// Broker consumer reading raw payloads from subscribed topics.
#[async_trait]
pub trait CommentConsumer: Send + Sync {
    /// Subscribe to `topics`, replacing any previous subscription.
    ///
    /// # Errors
    /// Returns [`BrokerError::Consume`] when the subscription is rejected.
    fn subscribe(&self, topics: &[&str]) -> Result<(), BrokerError>;

    /// Wait for the next record.
    ///
    /// # Errors
    /// Returns [`BrokerError::Consume`] on broker or poll failures.
    async fn recv(&self) -> Result<ConsumedRecord, BrokerError>;
}

/// Adapt a subscribed consumer into an endless stream of records.
pub fn record_stream<C>(consumer: &C) -> impl Stream<Item = Result<ConsumedRecord, BrokerError>> + '_
where
    C: CommentConsumer + ?Sized,
{
    stream::unfold(consumer, |consumer| async move {
        let next = consumer.recv().await;
        Some((next, consumer))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Mutex;

    struct ScriptedConsumer {
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl CommentConsumer for ScriptedConsumer {
        fn subscribe(&self, _topics: &[&str]) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn recv(&self) -> Result<ConsumedRecord, BrokerError> {
            let next = self.payloads.lock().unwrap().pop();
            next.map(|payload| ConsumedRecord {
                topic: "reddit_comments".to_owned(),
                partition: 0,
                offset: 0,
                payload,
            })
            .ok_or_else(|| BrokerError::Consume("drained".to_owned()))
        }
    }

    #[tokio::test]
    async fn record_stream_yields_consumer_results_in_order() {
        let consumer = ScriptedConsumer {
            payloads: Mutex::new(vec![b"second".to_vec(), b"first".to_vec()]),
        };

        let items: Vec<_> = record_stream(&consumer).take(3).collect().await;

        assert_eq!(items[0].as_ref().unwrap().payload, b"first");
        assert_eq!(items[1].as_ref().unwrap().payload, b"second");
        assert!(matches!(items[2], Err(BrokerError::Consume(_))));
    }

    #[test]
    fn search_options_default_to_relevance_over_all_time() {
        let opts = SearchOptions::relevance_all_time(3);
        assert_eq!(opts.limit, 3);
        assert_eq!(opts.sort.as_str(), "relevance");
        assert_eq!(opts.time.as_str(), "all");
    }
}
