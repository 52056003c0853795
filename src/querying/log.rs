//! Log queries

use crate::core::{Cursor, QueryRequest, QueryType};
use crate::error::Result;
use crate::querying::query_processing::{decode_data, to_unix_seconds, QueryMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Filter parameters of a log query.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    log: LogOptions<'a>,
}

#[derive(Serialize)]
struct LogOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ascending: Option<bool>,
}

/// One matching log event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogMatch {
    pub server_info: HashMap<String, Value>,
    pub session_id: String,
    pub severity: i32,
    pub thread_id: String,
    pub timestamp: i64,
    pub values: HashMap<String, Value>,
}

/// A log event together with the cursor identifying it.
#[derive(Debug, Clone, Deserialize)]
pub struct CursoredLogMatch {
    #[serde(flatten)]
    pub log_match: LogMatch,
    pub cursor: Cursor,
}

#[derive(Deserialize)]
struct LogData<M> {
    #[serde(default = "Vec::new")]
    matches: Vec<M>,
}

impl<M> Default for LogData<M> {
    fn default() -> Self {
        Self { matches: Vec::new() }
    }
}

impl LogQuery {
    /// Serialize the query with optional pagination options.
    pub fn build_request_with(&self, cursor: Option<&Cursor>, ascending: Option<bool>) -> Result<QueryRequest> {
        let payload = LogRequest {
            query_type: QueryType::Log,
            start_time: to_unix_seconds(self.start_time),
            end_time: to_unix_seconds(self.end_time),
            log: LogOptions {
                filter: self.filter.as_deref(),
                limit: self.limit,
                cursor,
                ascending,
            },
        };
        QueryRequest::from_payload(QueryType::Log, &payload)
    }

    /// Decode matches keeping each one's cursor.
    pub fn decode_cursored(&self, data: &[u8]) -> Result<Vec<CursoredLogMatch>> {
        decode_data::<LogData<CursoredLogMatch>>(data).map(|data| data.matches)
    }
}

impl QueryMapper for LogQuery {
    type Response = Vec<LogMatch>;

    fn query_type(&self) -> QueryType {
        QueryType::Log
    }

    fn build_request(&self) -> Result<QueryRequest> {
        self.build_request_with(None, None)
    }

    fn decode_response(&self, data: &[u8]) -> Result<Vec<LogMatch>> {
        decode_data::<LogData<LogMatch>>(data).map(|data| data.matches)
    }
}
