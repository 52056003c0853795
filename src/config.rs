//! Client configuration
//!
//! Everything that used to be a constant in the request loop (poll backoff,
//! rate-limit budget, HTTP timeout) lives here so tests can run the
//! protocol with accelerated timings.

use crate::error::{LrqError, Result};
use std::time::Duration;

/// Environment variable holding the service base URL
pub const ENV_DATASET_URL: &str = "DATASET_URL";
/// Environment variable holding the API key
pub const ENV_DATASET_API_KEY: &str = "DATASET_API_KEY";

/// Poll backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first poll
    pub initial: Duration,
    /// Multiplier applied after every wait
    pub factor: f64,
    /// Upper bound for any single delay
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 1.2,
            max: Duration::from_secs(2),
        }
    }
}

/// Token bucket parameters for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Permits refilled per `period`
    pub permits: u32,
    /// Refill period for `permits`
    pub period: Duration,
    /// Bucket capacity; the bucket starts full
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 100 requests per minute with a burst/bucket size of 100
        Self {
            permits: 100,
            period: Duration::from_secs(60),
            burst: 100,
        }
    }
}

/// Configuration for an [`LrqClient`](crate::api::client::LrqClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `https://app.scalyr.com`
    pub base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    pub backoff: BackoffConfig,
    pub rate_limit: RateLimitConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Build a configuration from `DATASET_URL` and `DATASET_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_DATASET_URL)
            .map_err(|_| LrqError::Config(format!("{} is not set", ENV_DATASET_URL)))?;
        let api_key = std::env::var(ENV_DATASET_API_KEY)
            .map_err(|_| LrqError::Config(format!("{} is not set", ENV_DATASET_API_KEY)))?;
        let config = Self::new(base_url, api_key);
        config.validate()?;
        Ok(config)
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject configurations the executor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(LrqError::Config("base URL must not be empty".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(LrqError::Config("API key must not be empty".to_string()));
        }
        if !(self.backoff.factor >= 1.0) {
            return Err(LrqError::Config(format!(
                "backoff factor must be >= 1.0, got {}",
                self.backoff.factor
            )));
        }
        if self.backoff.initial > self.backoff.max {
            return Err(LrqError::Config(
                "initial backoff delay exceeds the maximum delay".to_string(),
            ));
        }
        if self.rate_limit.permits == 0 || self.rate_limit.burst == 0 {
            return Err(LrqError::Config("rate limit permits and burst must be non-zero".to_string()));
        }
        if self.rate_limit.period.is_zero() {
            return Err(LrqError::Config("rate limit period must be non-zero".to_string()));
        }
        Ok(())
    }
}
