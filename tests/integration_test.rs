//! Integration tests for dataset-lrq
//!
//! These tests exercise the public surface without a running service:
//! configuration, request shaping and the error types callers match on.

use dataset_lrq::pagination::dedup_page;
use dataset_lrq::querying::CursoredLogMatch;
use dataset_lrq::{
    ClientConfig, Cursor, LogQuery, LrqError, PlotQuery, QueryMapper, QueryType, Result,
};
use serde_json::{json, Value};

#[test]
fn test_error_types() {
    let config_error = LrqError::Config("test".to_string());
    assert!(format!("{}", config_error).contains("Configuration error"));

    let decode_error = LrqError::Decode("test".to_string());
    assert!(format!("{}", decode_error).contains("Decode error"));

    let request_error = LrqError::InvalidRequest("test".to_string());
    assert!(format!("{}", request_error).contains("Invalid request"));

    let transport_error = LrqError::Transport("test".to_string());
    assert!(format!("{}", transport_error).contains("Transport error"));
}

#[test]
fn test_result_type() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    fn returns_err() -> Result<i32> {
        Err(LrqError::RateLimitCancelled)
    }

    assert!(returns_ok().is_ok());
    assert!(returns_err().is_err());
}

#[test]
fn test_config_rejects_missing_key() {
    let err = ClientConfig::new("https://app.scalyr.com", "").validate().unwrap_err();
    assert!(matches!(err, LrqError::Config(_)));
}

#[test]
fn test_paginated_log_request_shape() {
    let query = LogQuery { filter: Some("error".to_string()), ..Default::default() };
    let request = query.build_request_with(Some(&Cursor::new("abc")), Some(true)).unwrap();

    assert_eq!(request.query_type(), QueryType::Log);
    let body: Value = serde_json::from_slice(request.body()).unwrap();
    assert_eq!(body["queryType"], json!("LOG"));
    assert_eq!(body["log"]["cursor"], json!("abc"));
    assert_eq!(body["log"]["ascending"], json!(true));
}

#[test]
fn test_plot_without_slicing_is_invalid() {
    assert!(matches!(PlotQuery::new("count()").build_request(), Err(LrqError::InvalidRequest(_))));
}

#[test]
fn test_dedup_through_public_api() {
    let matches: Vec<CursoredLogMatch> = serde_json::from_value(json!([
        {"cursor": "a", "timestamp": 1},
        {"cursor": "b", "timestamp": 2}
    ]))
    .unwrap();

    let (kept, next) = dedup_page(Some(&Cursor::new("a")), matches);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].timestamp, 2);
    assert_eq!(next, Some(Cursor::new("b")));
}
