//! Delivery producer backed by rdkafka's `FutureProducer`.

use std::time::Duration;

use comment_relay_sdk::{AckSender, BrokerError, DeliveryAck, DeliveryProducer, OutboundRecord};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, info, warn};

use crate::config::KafkaConfig;

/// Producer that reports each record's delivery on the caller's one-shot channel.
pub struct KafkaDeliveryProducer {
    producer: FutureProducer,
    close_timeout: Duration,
}

impl KafkaDeliveryProducer {
    /// Create the producer. librdkafka connects lazily, so this does not touch the network.
    ///
    /// # Errors
    /// Returns [`BrokerError::Config`] when librdkafka rejects the configuration.
    pub fn new(cfg: &KafkaConfig) -> Result<Self, BrokerError> {
        if cfg.bootstrap_servers.trim().is_empty() {
            return Err(BrokerError::Config("bootstrap_servers is empty".to_owned()));
        }
        let producer: FutureProducer = cfg
            .producer_config()
            .create()
            .map_err(|e| BrokerError::Config(format!("failed to create producer: {e}")))?;

        info!(bootstrap_servers = %cfg.bootstrap_servers, "kafka producer created");
        Ok(Self {
            producer,
            close_timeout: cfg.close_timeout,
        })
    }

    /// Fetch cluster metadata to prove the brokers are reachable.
    ///
    /// # Errors
    /// Returns [`BrokerError::Config`] when no broker answers within `timeout`.
    pub async fn check_connectivity(&self, timeout: Duration) -> Result<usize, BrokerError> {
        let producer = self.producer.clone();
        let metadata = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, Timeout::After(timeout))
                .map(|m| m.brokers().len())
        })
        .await
        .map_err(|e| BrokerError::Config(format!("metadata task failed: {e}")))?
        .map_err(|e| BrokerError::Config(format!("brokers unreachable: {e}")))?;
        if metadata == 0 {
            return Err(BrokerError::Config(
                "brokers unreachable: metadata lists no brokers".to_owned(),
            ));
        }

        debug!(brokers = metadata, "kafka metadata fetched");
        Ok(metadata)
    }

    /// Flush outstanding deliveries, waiting at most the configured close timeout.
    ///
    /// # Errors
    /// Returns [`BrokerError::Delivery`] when messages are still queued at the deadline.
    pub fn close(&self) -> Result<(), BrokerError> {
        let pending = self.producer.in_flight_count();
        self.producer
            .flush(Timeout::After(self.close_timeout))
            .map_err(|e| BrokerError::Delivery(format!("flush failed: {e}")))?;
        info!(flushed = pending, "kafka producer closed");
        Ok(())
    }
}

impl DeliveryProducer for KafkaDeliveryProducer {
    fn submit(&self, record: OutboundRecord, ack: AckSender) -> Result<(), BrokerError> {
        let mut future_record: FutureRecord<'_, str, [u8]> =
            FutureRecord::to(&record.topic).payload(record.payload.as_slice());
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }

        let delivery = self
            .producer
            .send_result(future_record)
            .map_err(|(e, _)| BrokerError::Submit(e.to_string()))?;

        tokio::spawn(async move {
            // A cancelled delivery future drops `ack`, which the receiver observes as closed.
            let Ok(result) = delivery.await else {
                warn!("delivery report cancelled by producer");
                return;
            };
            let report = match result {
                Ok((partition, offset)) => Ok(DeliveryAck { partition, offset }),
                Err((e, _message)) => Err(BrokerError::Delivery(e.to_string())),
            };
            let _ = ack.send(report);
        });
        Ok(())
    }
}
