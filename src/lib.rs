//! # dataset-lrq
//!
//! Client for DataSet long-running queries (LRQs).
//!
//! A query submitted to `/v2/api/queries` may not finish within the
//! submission request. The service reports progress as steps completed out
//! of a total, the client polls until the query is done, and then deletes
//! it to release the server-side resources. This crate runs that lifecycle
//! and layers typed query builders and cursor pagination of log results on
//! top of it.
//!
//! ## Features
//!
//! - Submit / poll / cleanup executor with capped backoff and cancellation
//! - Shared FIFO rate limiting across concurrent queries
//! - Distribution, top facets, facet values, log, plot and PowerQuery mappers
//! - Forward pagination of log matches without duplicate boundary records
//!
//! ## Example
//!
//! ```rust,no_run
//! use dataset_lrq::{ClientConfig, LogQuery, LrqClient, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> Result<()> {
//!     let client = LrqClient::new(ClientConfig::new("https://app.scalyr.com", "api-key"))?;
//!     let query = LogQuery { filter: Some("error".to_string()), ..Default::default() };
//!
//!     let matches = client.paginate_logs(query).collect_all(&CancellationToken::new()).await?;
//!     println!("{} matches", matches.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::ref_option)]

/// Public client API
pub mod api;

/// Client configuration
pub mod config;

/// Core data structures and types
pub mod core;

pub mod error;

/// Long-running query execution
pub mod execution;

/// Outbound HTTP plumbing
pub mod http;

/// Cursor pagination of log queries
pub mod pagination;

/// Query request builders and response decoders
pub mod querying;

// Re-export commonly used types
pub use api::LrqClient;
pub use config::{BackoffConfig, ClientConfig, RateLimitConfig};
pub use core::{Completion, Cursor, DynamicValue, QueryRequest, QueryResult, QueryType};
pub use error::{LrqError, Result};
pub use execution::{LrqExecutor, LrqOutcome};
pub use pagination::{LogPage, LogPaginator};
pub use querying::{
    DistributionQuery, FacetValuesQuery, LogMatch, LogQuery, PlotQuery, PqPlotQuery, PqTableQuery,
    QueryMapper, TopFacetsQuery,
};
