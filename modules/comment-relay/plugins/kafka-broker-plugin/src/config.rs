//! Plugin configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use serde::{Deserialize, Serialize};

/// Kafka connection, topic and delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    /// Topic comment records are published to and consumed from.
    pub topic: String,
    /// Consumer group of the `consume` command.
    pub group_id: String,
    pub client_id: String,
    /// Producer acknowledgment level (`0`, `1` or `all`).
    pub acks: String,
    /// How long one publish call waits for its delivery report.
    #[serde(with = "relay_utils::humantime_serde")]
    pub delivery_timeout: Duration,
    /// librdkafka's own bound on a queued message (`message.timeout.ms`).
    #[serde(with = "relay_utils::humantime_serde")]
    pub message_timeout: Duration,
    /// Bound on the startup metadata request that proves a broker is reachable.
    #[serde(with = "relay_utils::humantime_serde")]
    pub connect_timeout: Duration,
    /// Flush deadline when the producer is closed.
    #[serde(with = "relay_utils::humantime_serde")]
    pub close_timeout: Duration,
    /// Raw librdkafka properties applied last, e.g. `security.protocol`.
    pub properties: BTreeMap<String, String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_owned(),
            topic: "reddit_comments".to_owned(),
            group_id: "reddit-consumer-group".to_owned(),
            client_id: "comment-relay".to_owned(),
            acks: "all".to_owned(),
            delivery_timeout: Duration::from_secs(10),
            message_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            close_timeout: Duration::from_secs(5),
            properties: BTreeMap::new(),
        }
    }
}

impl KafkaConfig {
    fn base_client_config(&self) -> ClientConfig {
        let mut cfg = ClientConfig::new();
        cfg.set("bootstrap.servers", &self.bootstrap_servers)
            .set("client.id", &self.client_id);
        cfg
    }

    fn apply_properties(&self, cfg: &mut ClientConfig) {
        for (key, value) in &self.properties {
            cfg.set(key, value);
        }
    }

    /// librdkafka settings of the delivery producer.
    #[must_use]
    pub fn producer_config(&self) -> ClientConfig {
        let mut cfg = self.base_client_config();
        cfg.set("acks", &self.acks)
            .set("message.timeout.ms", millis(self.message_timeout));
        self.apply_properties(&mut cfg);
        cfg
    }

    /// librdkafka settings of the topic consumer. New groups start from the earliest offset.
    #[must_use]
    pub fn consumer_config(&self) -> ClientConfig {
        let mut cfg = self.base_client_config();
        cfg.set("group.id", &self.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true");
        self.apply_properties(&mut cfg);
        cfg
    }
}

fn millis(d: Duration) -> String {
    d.as_millis().to_string()
}
