//! Authenticated, rate-limited request construction

use crate::error::Result;
use crate::http::rate_limiter::RateLimiter;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Client identifier sent with every request
pub const CLIENT_USER_AGENT: &str = concat!("dataset-lrq-rust/", env!("CARGO_PKG_VERSION"));

/// Produces outbound requests, each one paid for with a rate-limit permit.
#[derive(Debug, Clone)]
pub struct RateLimitedRequestBuilder {
    client: Client,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedRequestBuilder {
    pub fn new(client: Client, api_key: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self { client, api_key: api_key.into(), limiter }
    }

    /// Wait for a permit, then build the request.
    ///
    /// # Errors
    ///
    /// [`LrqError::RateLimitCancelled`](crate::LrqError::RateLimitCancelled)
    /// if `cancel` fires while waiting.
    pub async fn build(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> Result<RequestBuilder> {
        self.limiter.acquire(cancel).await?;
        Ok(self.decorate(method, url, body))
    }

    /// Same as [`build`](Self::build) but ignores cancellation.
    pub async fn build_detached(&self, method: Method, url: &str) -> RequestBuilder {
        self.limiter.acquire_detached().await;
        self.decorate(method, url, None)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    fn decorate(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT);

        match body {
            Some(body) => request.body(body),
            None => request,
        }
    }
}
