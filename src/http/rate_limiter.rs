//! Request rate limiting
//!
//! Token bucket shared by every execution of a client. Waiters are served in
//! arrival order: the bucket sits behind tokio's fair mutex and the lock is
//! held across the refill wait, so a later caller can never overtake an
//! earlier one.

use crate::config::RateLimitConfig;
use crate::error::{LrqError, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, capacity: f64, per_second: f64) {
        if now <= self.last_refill {
            return;
        }
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_second).min(capacity);
        self.last_refill = now;
    }
}

/// FIFO token bucket limiter.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    capacity: f64,
    per_second: f64,
}

impl RateLimiter {
    /// Create a limiter that starts with a full bucket.
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst);
        Self {
            bucket: Mutex::new(Bucket { tokens: capacity, last_refill: Instant::now() }),
            capacity,
            per_second: f64::from(config.permits) / config.period.as_secs_f64(),
        }
    }

    /// Take one permit, waiting for a refill if the bucket is empty.
    ///
    /// Fails with [`LrqError::RateLimitCancelled`] if `cancel` fires first;
    /// in that case no permit is consumed.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LrqError::RateLimitCancelled),
            _ = self.acquire_detached() => Ok(()),
        }
    }

    /// Take one permit without any cancellation signal.
    ///
    /// Used for the cleanup request, which must still go out after the
    /// caller has cancelled.
    pub async fn acquire_detached(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now(), self.capacity, self.per_second);

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(deficit / self.per_second);
            debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting for a permit");
            // Dropping this future here leaves the bucket untouched.
            tokio::time::sleep(wait).await;
            bucket.refill(Instant::now(), self.capacity, self.per_second);
        }

        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    /// Whole permits currently available without waiting.
    pub async fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now(), self.capacity, self.per_second);
        bucket.tokens.floor() as u32
    }
}
