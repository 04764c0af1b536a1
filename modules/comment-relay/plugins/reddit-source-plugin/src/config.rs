//! Plugin configuration.

use std::time::Duration;

use relay_utils::SecretString;
use serde::{Deserialize, Serialize};

/// Configuration of the Reddit content source.
///
/// The four credentials are optional at the serde level so that a partially
/// filled config still deserializes; [`RedditConfig::credentials`] reports every
/// missing one at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Reddit rejects requests with generic user agents.
    pub user_agent: String,
    /// Base URL of the OAuth token endpoint.
    pub auth_url: String,
    /// Base URL of the authenticated API.
    pub api_url: String,
    #[serde(with = "relay_utils::humantime_serde")]
    pub http_timeout: Duration,
    /// A cached token is renewed this long before it expires.
    #[serde(with = "relay_utils::humantime_serde")]
    pub token_refresh_margin: Duration,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            user_agent: concat!("rust:comment-relay:v", env!("CARGO_PKG_VERSION")).to_owned(),
            auth_url: "https://www.reddit.com".to_owned(),
            api_url: "https://oauth.reddit.com".to_owned(),
            http_timeout: Duration::from_secs(10),
            token_refresh_margin: Duration::from_secs(60),
        }
    }
}

/// Script-app credentials for the OAuth password grant.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub username: String,
    pub password: SecretString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RedditConfigError {
    #[error("missing reddit credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("invalid reddit {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("failed to build reddit http client: {0}")]
    HttpClient(String),
}

impl RedditConfig {
    /// Extract the credentials, failing with the full list of missing or blank ones.
    ///
    /// # Errors
    /// Returns [`RedditConfigError::MissingCredentials`].
    pub fn credentials(&self) -> Result<RedditCredentials, RedditConfigError> {
        let text = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        let secret = |v: &Option<SecretString>| v.as_ref().filter(|s| !s.is_blank()).cloned();

        let client_id = text(&self.client_id);
        let client_secret = secret(&self.client_secret);
        let username = text(&self.username);
        let password = secret(&self.password);

        match (client_id, client_secret, username, password) {
            (Some(client_id), Some(client_secret), Some(username), Some(password)) => {
                Ok(RedditCredentials {
                    client_id,
                    client_secret,
                    username,
                    password,
                })
            }
            (client_id, client_secret, username, password) => {
                let missing = [
                    ("client_id", client_id.is_none()),
                    ("client_secret", client_secret.is_none()),
                    ("username", username.is_none()),
                    ("password", password.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(RedditConfigError::MissingCredentials(missing))
            }
        }
    }
}
