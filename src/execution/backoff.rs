//! Poll backoff schedule

use crate::config::BackoffConfig;
use std::time::Duration;

/// Capped multiplicative backoff.
///
/// `current()` is the delay to wait now; `advance()` moves to
/// `min(max, round(delay * factor))`. The sequence never decreases and
/// never exceeds `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    factor: f64,
    max: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            delay: config.initial.min(config.max),
            factor: config.factor.max(1.0),
            max: config.max,
        }
    }

    pub fn current(&self) -> Duration {
        self.delay
    }

    pub fn advance(&mut self) {
        if self.delay >= self.max {
            return;
        }
        let next = (self.delay.as_nanos() as f64 * self.factor).round();
        self.delay = if next >= self.max.as_nanos() as f64 {
            self.max
        } else {
            Duration::from_nanos(next as u64)
        };
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current();
        self.advance();
        Some(delay)
    }
}
