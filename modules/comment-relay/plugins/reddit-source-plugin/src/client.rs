//! Reddit API client implementing [`ContentSource`].

use std::time::Duration;

use async_trait::async_trait;
use comment_relay_sdk::{ContentSource, ContentSourceError, Post, SearchOptions};
use relay_utils::SecretString;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::{RedditConfig, RedditConfigError, RedditCredentials};
use crate::listing::{Listing, PostData, PostWithComments, Thing, comment_tree};

/// Used when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    /// Reddit reports bad credentials as a 200 with an `error` field.
    #[serde(default)]
    error: Option<String>,
}

struct CachedToken {
    value: SecretString,
    refresh_at: Instant,
}

/// Authenticated Reddit client. One instance is shared by all requests; the
/// access token is fetched lazily and reused until shortly before it expires.
pub struct RedditClient {
    http: reqwest::Client,
    auth_url: Url,
    api_url: Url,
    credentials: RedditCredentials,
    refresh_margin: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    /// Build a client from config.
    ///
    /// # Errors
    /// Returns [`RedditConfigError`] for missing credentials, unusable base URLs
    /// or an HTTP client that cannot be built.
    pub fn new(cfg: &RedditConfig) -> Result<Self, RedditConfigError> {
        let credentials = cfg.credentials()?;
        let auth_url = base_url("auth_url", &cfg.auth_url)?;
        let api_url = base_url("api_url", &cfg.api_url)?;

        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| RedditConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            auth_url,
            api_url,
            credentials,
            refresh_margin: cfg.token_refresh_margin,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<SecretString, ContentSourceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate_token(&self) {
        self.token.lock().await.take();
    }

    #[instrument(skip(self), fields(username = %self.credentials.username))]
    async fn request_token(&self) -> Result<CachedToken, ContentSourceError> {
        let url = endpoint(&self.auth_url, &["api", "v1", "access_token"]);
        let form = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose()),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret.expose()),
            )
            .form(&form)
            .send()
            .await
            .map_err(network)?;
        let response = check_status(response, "access token")?;

        let body: TokenResponse = response.json().await.map_err(decode)?;
        if let Some(error) = body.error {
            warn!(%error, "token endpoint rejected credentials");
            return Err(ContentSourceError::Unauthorized(error));
        }
        let access_token = body
            .access_token
            .ok_or_else(|| ContentSourceError::Decode("token response without access_token".to_owned()))?;

        let ttl = body.expires_in.map_or(DEFAULT_TOKEN_TTL, Duration::from_secs);
        debug!(ttl = ?ttl, "obtained access token");

        Ok(CachedToken {
            value: SecretString::new(access_token),
            refresh_at: Instant::now() + ttl.saturating_sub(self.refresh_margin),
        })
    }

    /// Authenticated GET; a 401 drops the cached token so the next call re-authenticates.
    async fn get(
        &self,
        url: Url,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Response, ContentSourceError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .query(query)
            .send()
            .await
            .map_err(network)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        check_status(response, what)
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    #[instrument(skip(self, options), fields(limit = options.limit))]
    async fn search_posts(
        &self,
        query: &str,
        community: &str,
        options: SearchOptions,
    ) -> Result<Vec<Post>, ContentSourceError> {
        let url = endpoint(&self.api_url, &["r", community, "search"]);
        let limit = options.limit.to_string();
        let params = [
            ("q", query),
            ("restrict_sr", "true"),
            ("sort", "relevance"),
            ("t", "all"),
            ("limit", limit.as_str()),
            ("raw_json", "1"),
        ];

        let listing: Listing<Thing<PostData>> = self
            .get(url, &params, "search")
            .await?
            .json()
            .await
            .map_err(decode)?;

        let posts: Vec<Post> = listing
            .data
            .children
            .into_iter()
            .map(|thing| Post::from(thing.data))
            .collect();
        debug!(found = posts.len(), "search returned");
        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn get_post_with_comments(&self, post_id: &str) -> Result<Post, ContentSourceError> {
        let url = endpoint(&self.api_url, &["comments", post_id]);

        let (post_listing, comments): PostWithComments = self
            .get(url, &[("raw_json", "1")], "post")
            .await?
            .json()
            .await
            .map_err(decode)?;

        let data = post_listing
            .data
            .children
            .into_iter()
            .next()
            .ok_or_else(|| ContentSourceError::NotFound(format!("post {post_id}")))?
            .data;

        let mut post = Post::from(data);
        post.comments = comment_tree(comments);
        Ok(post)
    }
}

fn base_url(field: &'static str, raw: &str) -> Result<Url, RedditConfigError> {
    let url = Url::parse(raw).map_err(|e| RedditConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(RedditConfigError::InvalidUrl {
            field,
            reason: format!("{raw} is not an http(s) base URL"),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn check_status(response: Response, what: &str) -> Result<Response, ContentSourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(%status, what, "reddit request failed");
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => ContentSourceError::RateLimited {
            retry_after_secs: retry_after(response.headers()),
        },
        StatusCode::NOT_FOUND => ContentSourceError::NotFound(what.to_owned()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ContentSourceError::Unauthorized(format!("{what}: HTTP {status}"))
        }
        _ => ContentSourceError::Network(format!("{what}: HTTP {status}")),
    })
}

/// Seconds until the rate-limit window resets, from `x-ratelimit-reset` or `retry-after`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    ["x-ratelimit-reset", "retry-after"].iter().find_map(|name| {
        let raw = headers.get(*name)?.to_str().ok()?.trim();
        raw.parse::<u64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|secs| secs.max(0.0).ceil() as u64))
    })
}

#[allow(clippy::needless_pass_by_value)]
fn network(err: reqwest::Error) -> ContentSourceError {
    ContentSourceError::Network(err.to_string())
}

#[allow(clippy::needless_pass_by_value)]
fn decode(err: reqwest::Error) -> ContentSourceError {
    ContentSourceError::Decode(err.to_string())
}
