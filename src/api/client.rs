//! Top-level client tying configuration, rate limiting, the executor and
//! the query mappers together.

use crate::config::ClientConfig;
use crate::core::{Cursor, QueryRequest, QueryResult};
use crate::error::{LrqError, Result};
use crate::execution::{LrqExecutor, LrqOutcome};
use crate::http::{RateLimitedRequestBuilder, RateLimiter};
use crate::pagination::{fetch_log_page, LogPage, LogPaginator};
use crate::querying::{
    DistributionData, DistributionQuery, FacetValuesData, FacetValuesQuery, LogMatch, LogQuery,
    PlotData, PlotQuery, PqPlotQuery, PqTable, PqTableQuery, QueryMapper, TopFacet,
    TopFacetsQuery,
};
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for the long-running query API.
///
/// Cloning is cheap; clones share one rate limiter, so concurrent queries
/// issued through any of them draw from the same request budget.
///
/// # Example
///
/// ```ignore
/// let client = LrqClient::new(ClientConfig::new("https://app.scalyr.com", api_key))?;
/// let cancel = CancellationToken::new();
///
/// let facets = client.top_facets(&TopFacetsQuery::default(), &cancel).await?;
/// for facet in facets.value {
///     println!("{}: {}", facet.name, facet.match_count);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LrqClient {
    executor: LrqExecutor,
}

impl LrqClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LrqError::Config(format!("cannot build HTTP client: {}", e)))?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        let requests = RateLimitedRequestBuilder::new(http, config.api_key, limiter);

        debug!(base_url = %config.base_url, "LRQ client created");
        Ok(Self { executor: LrqExecutor::new(config.base_url, requests, config.backoff) })
    }

    /// Create a client from `DATASET_URL` and `DATASET_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn executor(&self) -> &LrqExecutor {
        &self.executor
    }

    /// Run an already serialized request and return the raw `data` payload.
    pub async fn execute_raw(&self, request: QueryRequest, cancel: &CancellationToken) -> Result<LrqOutcome> {
        self.executor.execute(request, cancel).await
    }

    /// Run any mapper through the executor and decode its response.
    pub async fn run<M: QueryMapper>(
        &self,
        mapper: &M,
        cancel: &CancellationToken,
    ) -> Result<QueryResult<M::Response>> {
        let request = mapper.build_request()?;
        let outcome = self.executor.execute(request, cancel).await?;
        let value = mapper.decode_response(&outcome.data)?;
        Ok(QueryResult { value, completion: outcome.completion })
    }

    pub async fn distribution(
        &self,
        query: &DistributionQuery,
        cancel: &CancellationToken,
    ) -> Result<QueryResult<DistributionData>> {
        self.run(query, cancel).await
    }

    pub async fn top_facets(
        &self,
        query: &TopFacetsQuery,
        cancel: &CancellationToken,
    ) -> Result<QueryResult<Vec<TopFacet>>> {
        self.run(query, cancel).await
    }

    pub async fn facet_values(
        &self,
        query: &FacetValuesQuery,
        cancel: &CancellationToken,
    ) -> Result<QueryResult<FacetValuesData>> {
        self.run(query, cancel).await
    }

    /// Single, unpaginated log query in the server's default order.
    pub async fn logs(&self, query: &LogQuery, cancel: &CancellationToken) -> Result<QueryResult<Vec<LogMatch>>> {
        self.run(query, cancel).await
    }

    pub async fn plot(&self, query: &PlotQuery, cancel: &CancellationToken) -> Result<QueryResult<PlotData>> {
        self.run(query, cancel).await
    }

    pub async fn pq_plot(&self, query: &PqPlotQuery, cancel: &CancellationToken) -> Result<QueryResult<PlotData>> {
        self.run(query, cancel).await
    }

    pub async fn pq_table(&self, query: &PqTableQuery, cancel: &CancellationToken) -> Result<QueryResult<PqTable>> {
        self.run(query, cancel).await
    }

    /// Fetch the log page following `cursor`; `None` requests the first page.
    pub async fn fetch_log_page(
        &self,
        query: &LogQuery,
        cursor: Option<&Cursor>,
        cancel: &CancellationToken,
    ) -> Result<LogPage> {
        fetch_log_page(&self.executor, query, cursor, cancel).await
    }

    /// Walk `query` forward from its first page.
    pub fn paginate_logs(&self, query: LogQuery) -> LogPaginator {
        LogPaginator::new(self.executor.clone(), query)
    }

    /// Walk `query` forward from a cursor returned by an earlier page.
    pub fn resume_logs(&self, query: LogQuery, cursor: Cursor) -> LogPaginator {
        LogPaginator::resume(self.executor.clone(), query, cursor)
    }
}
