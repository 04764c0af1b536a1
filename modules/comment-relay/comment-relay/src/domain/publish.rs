//! Synchronous produce-and-confirm pipeline.
//!
//! Every call serializes one message, submits it exactly once together with a
//! fresh one-shot acknowledgment channel, and waits for a single delivery
//! event. The caller gets a definitive outcome per message instead of a
//! fire-and-forget handle; throughput is traded for that certainty.

use std::sync::Arc;
use std::time::Duration;

use comment_relay_sdk::{DeliveryAck, DeliveryProducer, OutboundRecord};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

pub const DELIVERED_DETAIL: &str = "Comment sent to Kafka successfully";
pub const SERIALIZATION_FAILED_DETAIL: &str = "serialization failed";
pub const TIMEOUT_DETAIL: &str = "timeout";
pub const CHANNEL_CLOSED_DETAIL: &str = "delivery channel closed";

/// Result of one publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    pub detail: String,
    /// Partition/offset reported by the broker on success.
    pub ack: Option<DeliveryAck>,
}

impl DeliveryOutcome {
    fn delivered(ack: DeliveryAck) -> Self {
        Self {
            delivered: true,
            detail: DELIVERED_DETAIL.to_owned(),
            ack: Some(ack),
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            delivered: false,
            detail: detail.into(),
            ack: None,
        }
    }
}

/// Publishes domain messages as JSON onto a single topic.
pub struct PublishPipeline {
    producer: Arc<dyn DeliveryProducer>,
    topic: String,
    delivery_timeout: Duration,
}

impl PublishPipeline {
    #[must_use]
    pub fn new(
        producer: Arc<dyn DeliveryProducer>,
        topic: impl Into<String>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            producer,
            topic: topic.into(),
            delivery_timeout,
        }
    }

    /// Publish with the configured delivery timeout.
    pub async fn publish<M>(&self, key: Option<&str>, msg: &M) -> DeliveryOutcome
    where
        M: Serialize + ?Sized,
    {
        self.publish_within(key, msg, None).await
    }

    /// Publish, waiting no longer than the caller's own deadline when it is
    /// shorter than the configured delivery timeout.
    pub async fn publish_within<M>(
        &self,
        key: Option<&str>,
        msg: &M,
        caller_deadline: Option<Duration>,
    ) -> DeliveryOutcome
    where
        M: Serialize + ?Sized,
    {
        let timeout = caller_deadline.map_or(self.delivery_timeout, |d| d.min(self.delivery_timeout));
        self.publish_with_timeout(key, msg, timeout).await
    }

    /// Serialize `msg`, submit it once and wait at most `timeout` for its acknowledgment.
    #[instrument(skip(self, msg), fields(topic = %self.topic, key = ?key))]
    pub async fn publish_with_timeout<M>(
        &self,
        key: Option<&str>,
        msg: &M,
        timeout: Duration,
    ) -> DeliveryOutcome
    where
        M: Serialize + ?Sized,
    {
        let payload = match serde_json::to_vec(msg) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "message serialization failed; nothing sent");
                return DeliveryOutcome::failed(SERIALIZATION_FAILED_DETAIL);
            }
        };

        let record = OutboundRecord {
            topic: self.topic.clone(),
            key: key.map(str::to_owned),
            payload,
        };

        // The receiver lives only for this call; dropping it on any return path
        // releases the channel.
        let (ack_tx, ack_rx) = oneshot::channel();
        if let Err(e) = self.producer.submit(record, ack_tx) {
            warn!(error = %e, "broker rejected record at submission");
            return DeliveryOutcome::failed(e.to_string());
        }

        match tokio::time::timeout(timeout, ack_rx).await {
            Ok(Ok(Ok(ack))) => {
                info!(partition = ack.partition, offset = ack.offset, "message delivered");
                DeliveryOutcome::delivered(ack)
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "message delivery failed");
                DeliveryOutcome::failed(e.to_string())
            }
            Ok(Err(_closed)) => {
                warn!("producer dropped the acknowledgment channel");
                DeliveryOutcome::failed(CHANNEL_CLOSED_DETAIL)
            }
            Err(_elapsed) => {
                warn!(timeout = ?timeout, "no delivery report before timeout");
                DeliveryOutcome::failed(TIMEOUT_DETAIL)
            }
        }
    }
}
