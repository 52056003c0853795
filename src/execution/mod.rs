//! Query Execution Module
//!
//! This module drives long-running queries against the service.
//!
//! # Components
//!
//! - **LrqExecutor** - Submit, poll and release one query, returning its raw result
//! - **Backoff** - Capped multiplicative delay between polls
//!
//! # Example
//!
//! ```ignore
//! use dataset_lrq::execution::LrqExecutor;
//!
//! let executor = LrqExecutor::new(base_url, requests, BackoffConfig::default());
//! let outcome = executor.execute(request, &CancellationToken::new()).await?;
//! if !outcome.completion.is_complete() {
//!     eprintln!("partial result");
//! }
//! ```

pub mod backoff;
pub mod lrq_executor;

pub use backoff::Backoff;
pub use lrq_executor::{ForwardToken, LrqExecutor, LrqOutcome, FORWARD_TAG_HEADER};
