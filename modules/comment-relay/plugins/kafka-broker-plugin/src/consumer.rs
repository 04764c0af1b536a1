use async_trait::async_trait;
use comment_relay_sdk::{BrokerError, CommentConsumer, ConsumedRecord};
use rdkafka::Message;
use rdkafka::consumer::{Consumer, StreamConsumer};

use crate::config::KafkaConfig;

/// Topic consumer in the configured group, starting from the earliest offset.
pub struct KafkaCommentConsumer {
    consumer: StreamConsumer,
}

impl KafkaCommentConsumer {
    /// # Errors
    /// Returns [`BrokerError::Config`] when librdkafka rejects the configuration.
    pub fn new(cfg: &KafkaConfig) -> Result<Self, BrokerError> {
        let consumer: StreamConsumer = cfg
            .consumer_config()
            .create()
            .map_err(|e| BrokerError::Config(format!("failed to create consumer: {e}")))?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl CommentConsumer for KafkaCommentConsumer {
    fn subscribe(&self, topics: &[&str]) -> Result<(), BrokerError> {
        self.consumer
            .subscribe(topics)
            .map_err(|e| BrokerError::Consume(e.to_string()))
    }

    async fn recv(&self) -> Result<ConsumedRecord, BrokerError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| BrokerError::Consume(e.to_string()))?;

        Ok(ConsumedRecord {
            topic: message.topic().to_owned(),
            partition: message.partition(),
            offset: message.offset(),
            payload: message.payload().unwrap_or_default().to_vec(),
        })
    }
}
