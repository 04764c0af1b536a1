//! Application configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, the YAML file
//! passed with `--config`, `APP__SECTION__KEY` environment variables, and
//! finally CLI flags.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use comment_relay::GatewayConfig;
use comment_relay::gateway::CorsPolicy;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use kafka_broker_plugin::KafkaConfig;
use reddit_source_plugin::RedditConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const ENV_PREFIX: &str = "APP__";
const ENV_SEPARATOR: &str = "__";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub reddit: RedditConfig,
    pub kafka: KafkaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// How long open connections may drain after a shutdown signal.
    #[serde(with = "relay_utils::humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `comment_relay=debug,info`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and `APP__*` environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::Load`] when a layer cannot be read or does not match the schema.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Apply `--port` and `-v` on top of the loaded layers.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
        }
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Check every section and report all problems at once.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing each problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if let Err(e) = self.reddit.credentials() {
            problems.push(e.to_string());
        }
        if self.kafka.bootstrap_servers.trim().is_empty() {
            problems.push("kafka.bootstrap_servers must not be empty".to_owned());
        }
        if self.kafka.topic.trim().is_empty() {
            problems.push("kafka.topic must not be empty".to_owned());
        }
        if self.kafka.delivery_timeout.is_zero() {
            problems.push("kafka.delivery_timeout must be greater than zero".to_owned());
        }
        if self.kafka.connect_timeout.is_zero() {
            problems.push("kafka.connect_timeout must be greater than zero".to_owned());
        }
        if self.gateway.request_timeout.is_zero() {
            problems.push("gateway.request_timeout must be greater than zero".to_owned());
        }
        if self.gateway.body_limit_bytes == 0 {
            problems.push("gateway.body_limit_bytes must be greater than zero".to_owned());
        }
        if let Err(e) = CorsPolicy::from_config(&self.gateway.cors) {
            problems.push(e.to_string());
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            problems.push(format!(
                "logging.level {:?} is not a valid filter: {e}",
                self.logging.level
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Render the effective configuration as YAML. Secrets are printed redacted.
    ///
    /// # Errors
    /// Returns [`ConfigError::Render`] when serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self).map_err(|e| ConfigError::Render(e.to_string()))
    }
}
