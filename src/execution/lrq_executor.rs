//! Long-running query executor
//!
//! Drives one query through the service's submit → poll → cleanup protocol:
//!
//! 1. `POST /v2/api/queries` with the query body. The response may already
//!    hold the result (`stepsCompleted >= totalSteps`).
//! 2. While incomplete, wait out the backoff delay and
//!    `GET /v2/api/queries/{id}?lastStepSeen={n}`.
//! 3. `DELETE /v2/api/queries/{id}?lastStepSeen={n}` to release the
//!    server-side resources.
//!
//! The forward tag returned with the submission response routes the polls
//! and the delete to the backend node holding the query, so it is attached
//! to both.

use crate::config::BackoffConfig;
use crate::core::{Completion, QueryRequest};
use crate::error::{LrqError, Result};
use crate::execution::backoff::Backoff;
use crate::http::RateLimitedRequestBuilder;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Header carrying the routing tag between submission, polls and cleanup
pub const FORWARD_TAG_HEADER: &str = "X-Dataset-Query-Forward-Tag";

const QUERIES_PATH: &str = "/v2/api/queries";

/// Routing token captured from the submission response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardToken(String);

impl ForwardToken {
    /// Read the token from response headers; an empty value counts as absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(FORWARD_TAG_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| ForwardToken(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle states of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LrqState {
    Submitted,
    Polling,
    Complete,
    CleanedUp,
    Aborted,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerError {
    Detailed { message: Option<String> },
    Plain(String),
}

impl ServerError {
    fn into_message(self) -> Option<String> {
        match self {
            ServerError::Detailed { message } => message,
            ServerError::Plain(message) => Some(message),
        }
    }
}

/// Response envelope shared by submission and polls. Every field is
/// optional so a poll only overwrites what it actually carries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryEnvelope {
    id: Option<String>,
    steps_completed: Option<u64>,
    total_steps: Option<u64>,
    data: Option<Box<RawValue>>,
    error: Option<ServerError>,
}

/// Decoded state of the most recent server response.
#[derive(Debug, Clone)]
pub(crate) struct QuerySnapshot {
    id: String,
    steps_completed: u64,
    steps_total: u64,
    data: Option<Box<RawValue>>,
    error: Option<String>,
}

impl QuerySnapshot {
    fn from_submission(envelope: QueryEnvelope) -> Self {
        Self {
            id: envelope.id.unwrap_or_default(),
            steps_completed: envelope.steps_completed.unwrap_or(0),
            steps_total: envelope.total_steps.unwrap_or(0),
            data: envelope.data,
            error: envelope.error.and_then(ServerError::into_message),
        }
    }

    /// Fold a poll response into the snapshot. `steps_total` stays as
    /// reported on submission and `steps_completed` never goes backwards.
    fn merge(&mut self, envelope: QueryEnvelope) {
        if let Some(id) = envelope.id.filter(|id| !id.is_empty()) {
            self.id = id;
        }
        if let Some(steps) = envelope.steps_completed {
            self.steps_completed = self.steps_completed.max(steps);
        }
        if let Some(data) = envelope.data {
            self.data = Some(data);
        }
        if let Some(error) = envelope.error {
            self.error = error.into_message();
        }
    }

    fn is_complete(&self) -> bool {
        self.steps_completed >= self.steps_total
    }

    fn completion(&self) -> Completion {
        if self.is_complete() {
            Completion::Complete
        } else {
            Completion::Partial {
                steps_completed: self.steps_completed,
                steps_total: self.steps_total,
            }
        }
    }

    fn data_bytes(&self) -> Vec<u8> {
        match &self.data {
            Some(data) => data.get().as_bytes().to_vec(),
            None => b"null".to_vec(),
        }
    }
}

/// Result of one execution.
#[derive(Debug, Clone)]
pub struct LrqOutcome {
    pub query_id: String,
    /// Raw `data` payload as last reported by the server (`null` if never sent)
    pub data: Vec<u8>,
    pub completion: Completion,
    /// Number of poll requests issued after submission
    pub polls: u32,
}

/// Per-execution state. Dropped once `execute` returns.
struct QueryLifecycle {
    state: LrqState,
    snapshot: QuerySnapshot,
    token: Option<ForwardToken>,
    polls: u32,
}

impl QueryLifecycle {
    fn transition(&mut self, next: LrqState) {
        debug!(
            query_id = %self.snapshot.id,
            from = ?self.state,
            to = ?next,
            steps_completed = self.snapshot.steps_completed,
            steps_total = self.snapshot.steps_total,
            "query state transition"
        );
        self.state = next;
    }

    fn abort(&mut self, err: LrqError) -> LrqError {
        warn!(query_id = %self.snapshot.id, error = %err, "query aborted");
        self.transition(LrqState::Aborted);
        err
    }

    fn query_url(&self, base_url: &str) -> String {
        format!(
            "{}{}/{}?lastStepSeen={}",
            base_url,
            QUERIES_PATH,
            urlencoding::encode(&self.snapshot.id),
            self.snapshot.steps_completed
        )
    }
}

/// Runs queries through the long-running query protocol.
#[derive(Debug, Clone)]
pub struct LrqExecutor {
    base_url: String,
    requests: RateLimitedRequestBuilder,
    backoff: BackoffConfig,
}

impl LrqExecutor {
    pub fn new(
        base_url: impl Into<String>,
        requests: RateLimitedRequestBuilder,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            requests,
            backoff,
        }
    }

    /// Submit `request`, poll until the server reports completion, release
    /// the query, and return its raw `data` payload.
    ///
    /// If `cancel` fires during a poll wait, polling stops, cleanup is still
    /// issued, and the last data received is returned marked
    /// [`Completion::Partial`].
    ///
    /// # Errors
    ///
    /// - [`LrqError::RateLimitCancelled`] if `cancel` fires while waiting
    ///   for a permit for the submission or a poll; in the poll case the
    ///   query is still released first
    /// - [`LrqError::Transport`] on network failures
    /// - [`LrqError::QueryFailed`] on a non-2xx submission or poll
    /// - [`LrqError::Decode`] on a malformed envelope
    ///
    /// None of these are retried. Apart from the poll cancellation above,
    /// no cleanup is attempted after them.
    pub async fn execute(&self, request: QueryRequest, cancel: &CancellationToken) -> Result<LrqOutcome> {
        let query_type = request.query_type();
        let mut lifecycle = self.submit(request, cancel).await?;
        debug!(
            query_id = %lifecycle.snapshot.id,
            query_type = %query_type,
            forwarded = lifecycle.token.is_some(),
            "query submitted"
        );

        if !lifecycle.snapshot.is_complete() {
            if lifecycle.snapshot.id.is_empty() {
                let err = LrqError::Decode("incomplete query response is missing its id".to_string());
                return Err(lifecycle.abort(err));
            }
            lifecycle.transition(LrqState::Polling);
            match self.poll_until_complete(&mut lifecycle, cancel).await {
                Ok(()) => {}
                // The query exists server-side, so it is still released.
                Err(LrqError::RateLimitCancelled) => {
                    info!(
                        query_id = %lifecycle.snapshot.id,
                        "cancelled while waiting to poll, releasing query"
                    );
                    self.cleanup(&mut lifecycle).await;
                    return Err(LrqError::RateLimitCancelled);
                }
                Err(err) => return Err(lifecycle.abort(err)),
            }
        }

        if let Some(message) = &lifecycle.snapshot.error {
            warn!(query_id = %lifecycle.snapshot.id, error = %message, "server reported a query error");
        }

        let completion = lifecycle.snapshot.completion();
        if completion.is_complete() {
            lifecycle.transition(LrqState::Complete);
        } else {
            info!(
                query_id = %lifecycle.snapshot.id,
                steps_completed = lifecycle.snapshot.steps_completed,
                steps_total = lifecycle.snapshot.steps_total,
                "polling cancelled, returning partial result"
            );
        }

        // The payload handed back is the one held when cleanup is issued.
        let data = lifecycle.snapshot.data_bytes();
        self.cleanup(&mut lifecycle).await;

        Ok(LrqOutcome {
            query_id: lifecycle.snapshot.id,
            data,
            completion,
            polls: lifecycle.polls,
        })
    }

    async fn submit(&self, request: QueryRequest, cancel: &CancellationToken) -> Result<QueryLifecycle> {
        let url = format!("{}{}", self.base_url, QUERIES_PATH);
        let response = self
            .requests
            .build(Method::POST, &url, Some(request.into_body()), cancel)
            .await?
            .send()
            .await?;

        // Only the submission response may set the token.
        let token = ForwardToken::from_headers(response.headers());
        let envelope = read_envelope(response).await?;

        Ok(QueryLifecycle {
            state: LrqState::Submitted,
            snapshot: QuerySnapshot::from_submission(envelope),
            token,
            polls: 0,
        })
    }

    async fn poll_until_complete(
        &self,
        lifecycle: &mut QueryLifecycle,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut backoff = Backoff::new(self.backoff);

        while !lifecycle.snapshot.is_complete() {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(backoff.current()) => false,
            };
            if cancelled {
                return Ok(());
            }
            backoff.advance();

            self.poll_once(lifecycle, cancel).await?;
        }

        Ok(())
    }

    async fn poll_once(&self, lifecycle: &mut QueryLifecycle, cancel: &CancellationToken) -> Result<()> {
        let url = lifecycle.query_url(&self.base_url);
        let mut request = self.requests.build(Method::GET, &url, None, cancel).await?;
        if let Some(token) = &lifecycle.token {
            request = request.header(FORWARD_TAG_HEADER, token.as_str());
        }

        lifecycle.polls += 1;
        let response = request.send().await?;
        let envelope = read_envelope(response).await?;
        lifecycle.snapshot.merge(envelope);

        debug!(
            query_id = %lifecycle.snapshot.id,
            poll = lifecycle.polls,
            steps_completed = lifecycle.snapshot.steps_completed,
            steps_total = lifecycle.snapshot.steps_total,
            "query polled"
        );
        Ok(())
    }

    /// Release the server-side query. Failures are logged and ignored.
    async fn cleanup(&self, lifecycle: &mut QueryLifecycle) {
        if lifecycle.snapshot.id.is_empty() {
            debug!("query finished on submission without an id, nothing to release");
            lifecycle.transition(LrqState::CleanedUp);
            return;
        }

        let url = lifecycle.query_url(&self.base_url);
        let mut request = self.requests.build_detached(Method::DELETE, &url).await;
        if let Some(token) = &lifecycle.token {
            request = request.header(FORWARD_TAG_HEADER, token.as_str());
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                // Drain the body so the connection can be reused.
                let _ = response.bytes().await;
                if !status.is_success() {
                    warn!(query_id = %lifecycle.snapshot.id, %status, "query cleanup rejected");
                }
            }
            Err(err) => {
                warn!(query_id = %lifecycle.snapshot.id, error = %err, "query cleanup failed");
            }
        }

        lifecycle.transition(LrqState::CleanedUp);
    }
}

async fn read_envelope(response: Response) -> Result<QueryEnvelope> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<QueryEnvelope>(&bytes)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(ServerError::into_message);
        return Err(LrqError::QueryFailed { status, message });
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| LrqError::Decode(format!("invalid query response envelope: {}", e)))
}
