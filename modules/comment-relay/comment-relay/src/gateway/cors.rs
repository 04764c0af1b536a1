use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
};
use http::{HeaderMap, HeaderValue};
use tracing::warn;

use crate::config::CorsConfig;

#[derive(thiserror::Error, Debug)]
#[error("invalid CORS {field} value: {value:?}")]
pub struct CorsConfigError {
    field: &'static str,
    value: String,
}

/// Pre-rendered CORS header values stamped on every response.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    headers: Arc<HeaderMap>,
}

impl CorsPolicy {
    /// Build the policy from config.
    ///
    /// # Errors
    /// Returns [`CorsConfigError`] when a configured value is not a valid header value.
    pub fn from_config(cfg: &CorsConfig) -> Result<Self, CorsConfigError> {
        if cfg.allowed_origin == "*" {
            warn!("CORS allows any origin; every website may call the gateway from a browser");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            header_value("allowed_origin", &cfg.allowed_origin)?,
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            header_value("allowed_methods", &cfg.allowed_methods.join(", "))?,
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            header_value("allowed_headers", &cfg.allowed_headers.join(", "))?,
        );
        if !cfg.expose_headers.is_empty() {
            headers.insert(
                ACCESS_CONTROL_EXPOSE_HEADERS,
                header_value("expose_headers", &cfg.expose_headers.join(", "))?,
            );
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(cfg.max_age_seconds));

        Ok(Self {
            headers: Arc::new(headers),
        })
    }

    /// Overwrite the CORS headers of `target` with this policy.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in self.headers.iter() {
            target.insert(name.clone(), value.clone());
        }
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, CorsConfigError> {
    HeaderValue::from_str(value).map_err(|_| CorsConfigError {
        field,
        value: value.to_owned(),
    })
}

/// Middleware: run the inner service, then stamp the CORS headers on whatever it returned.
pub async fn apply_cors_headers(
    State(policy): State<CorsPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    policy.apply(response.headers_mut());
    response
}
