//! Rate-limited, caching HTTP client shared by the source adapters

use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limiter::SlidingWindowRateLimiter;
use crate::application::errors::SourceError;
use crate::domain::SourceType;
use crate::infrastructure::cache::TtlCache;

const USER_AGENT: &str = concat!("stackscout/", env!("CARGO_PKG_VERSION"));

/// Query string and extra headers for one request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

/// Access to one external source: responses are cached per key and calls
/// go out no faster than the injected limiter admits them. No retries.
pub struct RateLimitedClient {
    source_type: SourceType,
    client: Client,
    base_url: String,
    timeout: Duration,
    bearer_token: Option<String>,
    limiter: Arc<SlidingWindowRateLimiter>,
    cache: Arc<TtlCache<Value>>,
}

impl RateLimitedClient {
    pub fn new(
        source_type: SourceType,
        base_url: impl Into<String>,
        timeout: Duration,
        limiter: Arc<SlidingWindowRateLimiter>,
        cache: Arc<TtlCache<Value>>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            source_type,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            bearer_token: None,
            limiter,
            cache,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limiter(&self) -> &SlidingWindowRateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }

    /// GET `endpoint` relative to the base URL.
    ///
    /// A live cached value for `cache_key` is returned without touching the
    /// network or the limiter. Successful responses are cached for `cache_ttl`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        cache_key: Option<&str>,
        cache_ttl: Duration,
    ) -> Result<T, SourceError> {
        if let Some(key) = cache_key {
            if let Some(cached) = self.cache.get(key).await {
                debug!(source = %self.source_type, key, "Serving cached response");
                return self.decode(cached);
            }
        }

        self.limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!(source = %self.source_type, url = %url, "Sending request");

        let mut request = self.client.get(&url).query(&options.query);
        if !options
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(header::ACCEPT.as_str()))
        {
            request = request.header(header::ACCEPT, "application/json");
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(SourceError::RateLimited {
                source_type: self.source_type,
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                source_type: self.source_type,
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(|e| self.map_send_error(e))?;

        if let Some(key) = cache_key {
            self.cache.insert(key, body.clone(), cache_ttl).await;
        }

        self.decode(body)
    }

    /// Discard every cached response of this client
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    fn decode<T: DeserializeOwned>(&self, body: Value) -> Result<T, SourceError> {
        serde_json::from_value(body).map_err(|e| SourceError::Decode {
            source_type: self.source_type,
            message: e.to_string(),
        })
    }

    fn map_send_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout {
                source_type: self.source_type,
                seconds: self.timeout.as_secs(),
            }
        } else if error.is_decode() {
            SourceError::Decode {
                source_type: self.source_type,
                message: error.to_string(),
            }
        } else {
            SourceError::Network(error)
        }
    }
}
