//! Integration tests for cursor pagination of log queries
//!
//! The mock service below serves an ordered event stream in fixed-size
//! pages and can be told whether to repeat the boundary event.

use dataset_lrq::{
    BackoffConfig, ClientConfig, Completion, Cursor, LogQuery, LrqClient, RateLimitConfig,
};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate, Respond};

/// Serves events `c0..c{len}` in pages, starting at (echo) or after the
/// requested cursor.
struct EventStream {
    len: usize,
    page_size: usize,
    echo_boundary: bool,
    requested: Mutex<Vec<Value>>,
}

impl EventStream {
    fn new(len: usize, page_size: usize, echo_boundary: bool) -> Self {
        Self { len, page_size, echo_boundary, requested: Mutex::new(Vec::new()) }
    }

    fn event(index: usize) -> Value {
        json!({
            "cursor": format!("c{}", index),
            "timestamp": index,
            "severity": 3,
            "sessionId": "session-1",
            "threadId": "1",
            "values": {"message": format!("event {}", index)},
            "serverInfo": {"serverHost": "host-a"}
        })
    }
}

impl Respond for EventStream {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        self.requested.lock().unwrap().push(body["log"].clone());

        let start = match body["log"]["cursor"].as_str() {
            None => 0,
            Some(cursor) => {
                let index: usize = cursor.trim_start_matches('c').parse().unwrap();
                if self.echo_boundary { index } else { index + 1 }
            }
        };
        let end = (start + self.page_size).min(self.len);
        let matches: Vec<Value> = (start.min(end)..end).map(Self::event).collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "id": "q-page",
            "stepsCompleted": 1,
            "totalSteps": 1,
            "data": {"matches": matches}
        }))
    }
}

async fn serve(stream: EventStream) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/queries"))
        .respond_with(stream)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/v2/api/queries/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer) -> LrqClient {
    LrqClient::new(ClientConfig::new(server.uri(), "test-key")).expect("Failed to create client")
}

fn query() -> LogQuery {
    LogQuery { filter: Some("serverHost == 'host-a'".to_string()), limit: Some(3), ..Default::default() }
}

fn timestamps(matches: &[dataset_lrq::LogMatch]) -> Vec<i64> {
    matches.iter().map(|m| m.timestamp).collect()
}

async fn posted_log_options(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["log"].clone())
        .collect()
}

#[tokio::test]
async fn test_walk_with_boundary_echo_yields_each_event_once() {
    let server = serve(EventStream::new(7, 3, true)).await;

    let all = client(&server).paginate_logs(query()).collect_all(&CancellationToken::new()).await.unwrap();

    assert_eq!(timestamps(&all), vec![0, 1, 2, 3, 4, 5, 6]);

    let options = posted_log_options(&server).await;
    assert!(options.iter().all(|o| o["ascending"] == json!(true)));
    assert!(options[0].get("cursor").is_none());
    assert_eq!(options[1]["cursor"], json!("c2"));
    assert_eq!(options[2]["cursor"], json!("c4"));
}

#[tokio::test]
async fn test_walk_without_boundary_echo_keeps_every_event() {
    let server = serve(EventStream::new(7, 3, false)).await;

    let all = client(&server).paginate_logs(query()).collect_all(&CancellationToken::new()).await.unwrap();

    assert_eq!(timestamps(&all), vec![0, 1, 2, 3, 4, 5, 6]);
    // 3 + 3 + 1 events, then an empty page ends the stream.
    assert_eq!(posted_log_options(&server).await.len(), 4);
}

#[tokio::test]
async fn test_page_by_page_cursors() {
    let server = serve(EventStream::new(4, 3, true)).await;
    let mut paginator = client(&server).paginate_logs(query());
    let cancel = CancellationToken::new();

    let first = paginator.next_page(&cancel).await.unwrap().expect("first page");
    assert_eq!(timestamps(&first.matches), vec![0, 1, 2]);
    assert_eq!(first.next_cursor, Some(Cursor::new("c2")));
    assert_eq!(first.completion, Completion::Complete);

    let second = paginator.next_page(&cancel).await.unwrap().expect("second page");
    assert_eq!(timestamps(&second.matches), vec![3]);
    assert_eq!(second.next_cursor, Some(Cursor::new("c3")));

    // Only the echoed boundary comes back, which ends the stream.
    let third = paginator.next_page(&cancel).await.unwrap().expect("third page");
    assert!(third.matches.is_empty());
    assert!(third.is_last());
    assert!(paginator.is_exhausted());

    assert!(paginator.next_page(&cancel).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resume_from_saved_cursor() {
    let server = serve(EventStream::new(6, 3, true)).await;

    let rest = client(&server)
        .resume_logs(query(), Cursor::new("c3"))
        .collect_all(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(timestamps(&rest), vec![4, 5]);
}

#[tokio::test]
async fn test_empty_first_page() {
    let server = serve(EventStream::new(0, 3, true)).await;

    let page = client(&server).fetch_log_page(&query(), None, &CancellationToken::new()).await.unwrap();

    assert!(page.matches.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_log_fields_survive_pagination() {
    let server = serve(EventStream::new(1, 3, true)).await;

    let page = client(&server).fetch_log_page(&query(), None, &CancellationToken::new()).await.unwrap();

    let event = &page.matches[0];
    assert_eq!(event.session_id, "session-1");
    assert_eq!(event.severity, 3);
    assert_eq!(event.values["message"], json!("event 0"));
    assert_eq!(event.server_info["serverHost"], json!("host-a"));
}

fn cancel_after(millis: u64) -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        trigger.cancel();
    });
    cancel
}

/// A service whose queries never finish before the client gives up.
async fn serve_unfinished() -> (MockServer, LrqClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "q-slow",
            "stepsCompleted": 0,
            "totalSteps": 5,
            "data": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/api/queries/q-slow"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri(), "test-key").with_backoff(BackoffConfig {
        initial: Duration::from_secs(30),
        factor: 1.2,
        max: Duration::from_secs(30),
    });
    let client = LrqClient::new(config).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_collect_all_keeps_pages_gathered_before_cancellation() {
    let server = serve(EventStream::new(5, 2, true)).await;

    // The first page spends both permits (submit and cleanup); the second
    // submission waits about a second for a refill.
    let config = ClientConfig::new(server.uri(), "test-key")
        .with_rate_limit(RateLimitConfig { permits: 1, period: Duration::from_secs(1), burst: 2 });
    let client = LrqClient::new(config).unwrap();

    let all = client.paginate_logs(query()).collect_all(&cancel_after(300)).await.unwrap();

    assert_eq!(timestamps(&all), vec![0, 1]);
    assert_eq!(posted_log_options(&server).await.len(), 1);
}

#[tokio::test]
async fn test_empty_partial_first_page_does_not_end_stream() {
    let (_server, client) = serve_unfinished().await;
    let mut paginator = client.paginate_logs(query());

    let page = paginator.next_page(&cancel_after(100)).await.unwrap().expect("partial page");

    assert_eq!(page.completion, Completion::Partial { steps_completed: 0, steps_total: 5 });
    assert!(page.matches.is_empty());
    assert!(page.next_cursor.is_none());
    assert!(!page.is_last());
    assert!(!paginator.is_exhausted());
    assert!(paginator.cursor().is_none());
}

#[tokio::test]
async fn test_empty_partial_page_keeps_resume_cursor() {
    let (_server, client) = serve_unfinished().await;
    let mut paginator = client.resume_logs(query(), Cursor::new("c3"));

    let page = paginator.next_page(&cancel_after(100)).await.unwrap().expect("partial page");

    assert_eq!(page.next_cursor, Some(Cursor::new("c3")));
    assert!(!page.is_last());
    assert!(!paginator.is_exhausted());
    assert_eq!(paginator.cursor(), Some(&Cursor::new("c3")));
}
