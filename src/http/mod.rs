//! Outbound HTTP plumbing
//!
//! - Token bucket rate limiting shared across executions
//! - Request construction with authentication and client identification

pub mod rate_limiter;
pub mod request_builder;

pub use rate_limiter::RateLimiter;
pub use request_builder::{RateLimitedRequestBuilder, CLIENT_USER_AGENT};
