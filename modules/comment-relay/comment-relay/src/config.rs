//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration of the HTTP gateway and the comment fetch handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Deadline for one comment fetch (search + fetch-with-comments).
    #[serde(with = "relay_utils::humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum JSON request body accepted on the fallback lane.
    pub body_limit_bytes: usize,

    /// Plain-text body returned for paths outside the service prefix.
    pub banner: String,

    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
            banner: "Reddit comment relay gateway. Send gRPC, gRPC-Web or JSON requests to /reddit_implementation.RedditService/.".to_owned(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS headers stamped on every gateway response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Headers browsers may read from gRPC-Web responses.
    pub expose_headers: Vec<String>,
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_owned(),
            allowed_methods: ["POST", "GET", "OPTIONS", "PUT", "DELETE"]
                .map(str::to_owned)
                .to_vec(),
            allowed_headers: [
                "Content-Type",
                "Authorization",
                "X-Grpc-Web",
                "X-User-Agent",
                "Grpc-Timeout",
                "Accept",
            ]
            .map(str::to_owned)
            .to_vec(),
            expose_headers: ["Grpc-Status", "Grpc-Message"].map(str::to_owned).to_vec(),
            max_age_seconds: 86_400,
        }
    }
}
