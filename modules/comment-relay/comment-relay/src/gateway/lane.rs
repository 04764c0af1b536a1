//! Lane classification.
//!
//! Decides, from method, path and headers alone, which processing path one
//! inbound exchange takes. Priority order:
//!
//! 1. `OPTIONS` of any path: preflight
//! 2. JSON media type in `Content-Type` or `Accept` on the comment-fetch path: JSON fallback
//! 3. gRPC content type, or an `x-grpc-web` header: RPC
//! 4. anything else: unroutable (client error inside the service prefix, banner outside)

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method};

const GRPC_CONTENT_TYPE_PREFIX: &str = "application/grpc";
const JSON_MEDIA_TYPE: &str = "application/json";
const GRPC_WEB_HEADER: &str = "x-grpc-web";

/// Processing path of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Preflight,
    JsonFallback,
    Rpc,
    /// No lane claimed the exchange. `in_service` is set when the path sits under
    /// the service prefix.
    Unroutable { in_service: bool },
}

impl Lane {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::JsonFallback => "json",
            Self::Rpc => "rpc",
            Self::Unroutable { in_service: true } => "unroutable",
            Self::Unroutable { in_service: false } => "banner",
        }
    }
}

/// Paths the gateway recognises for one RPC service.
#[derive(Debug, Clone)]
pub struct ServicePaths {
    prefix: String,
    json_endpoint: String,
}

impl ServicePaths {
    /// `service` is the fully-qualified gRPC service name; `json_method` the one
    /// method also served on the JSON fallback lane.
    #[must_use]
    pub fn new(service: &str, json_method: &str) -> Self {
        let prefix = format!("/{service}/");
        let json_endpoint = format!("{prefix}{json_method}");
        Self {
            prefix,
            json_endpoint,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn json_endpoint(&self) -> &str {
        &self.json_endpoint
    }

    /// Pick the lane for an exchange. Pure: equal inputs always give the same lane.
    #[must_use]
    pub fn classify(&self, method: &Method, path: &str, headers: &HeaderMap) -> Lane {
        if method == Method::OPTIONS {
            return Lane::Preflight;
        }
        if path == self.json_endpoint && wants_json(headers) {
            return Lane::JsonFallback;
        }
        if is_rpc(headers) {
            return Lane::Rpc;
        }
        Lane::Unroutable {
            in_service: path.starts_with(&self.prefix),
        }
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    [CONTENT_TYPE, ACCEPT].iter().any(|name| {
        headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(is_json_media_type)
    })
}

/// `application/json` with any parameters, compared case-insensitively.
fn is_json_media_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE)
}

fn is_rpc(headers: &HeaderMap) -> bool {
    if headers.contains_key(GRPC_WEB_HEADER) {
        return true;
    }
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .get(..GRPC_CONTENT_TYPE_PREFIX.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(GRPC_CONTENT_TYPE_PREFIX))
        })
}
