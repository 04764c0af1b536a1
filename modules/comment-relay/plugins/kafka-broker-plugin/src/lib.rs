//! Kafka Broker Plugin
//!
//! librdkafka-backed implementations of the comment relay's broker contracts:
//!
//! - `KafkaDeliveryProducer` - `DeliveryProducer` that forwards each record's
//!   delivery report (partition/offset or broker error) to the caller's
//!   one-shot channel
//! - `KafkaCommentConsumer` - `CommentConsumer` over a `StreamConsumer`

pub mod config;
pub use config::KafkaConfig;

mod consumer;
pub use consumer::KafkaCommentConsumer;

mod producer;
pub use producer::KafkaDeliveryProducer;
