//! Core data structures shared by the executor, the mappers and pagination

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query type discriminator sent as `queryType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Distribution,
    TopFacets,
    FacetValues,
    Log,
    Plot,
    #[serde(rename = "PQ")]
    Pq,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Distribution => "DISTRIBUTION",
            QueryType::TopFacets => "TOP_FACETS",
            QueryType::FacetValues => "FACET_VALUES",
            QueryType::Log => "LOG",
            QueryType::Plot => "PLOT",
            QueryType::Pq => "PQ",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serialized query body ready for submission. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    query_type: QueryType,
    body: Vec<u8>,
}

impl QueryRequest {
    pub fn new(query_type: QueryType, body: Vec<u8>) -> Self {
        Self { query_type, body }
    }

    /// Serialize `payload` as the request body.
    pub fn from_payload<T: Serialize>(query_type: QueryType, payload: &T) -> crate::Result<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| crate::LrqError::InvalidRequest(format!("cannot serialize {} query: {}", query_type, e)))?;
        Ok(Self::new(query_type, body))
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Opaque position marker identifying one log event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Whether an execution reached the server's final step.
///
/// A cancelled poll wait still returns the last data the server sent, marked
/// `Partial` so callers can tell it apart from a finished query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Complete,
    Partial { steps_completed: u64, steps_total: u64 },
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }
}

/// A decoded query response together with its completion status.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub value: T,
    pub completion: Completion,
}

impl<T> QueryResult<T> {
    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult { value: f(self.value), completion: self.completion }
    }
}

pub mod values;
pub use values::DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_wire_names() {
        assert_eq!(serde_json::to_string(&QueryType::TopFacets).unwrap(), "\"TOP_FACETS\"");
        assert_eq!(serde_json::to_string(&QueryType::FacetValues).unwrap(), "\"FACET_VALUES\"");
        assert_eq!(serde_json::to_string(&QueryType::Pq).unwrap(), "\"PQ\"");
        assert_eq!(QueryType::Distribution.to_string(), "DISTRIBUTION");
    }

    #[test]
    fn test_cursor_is_transparent() {
        let cursor: Cursor = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(cursor, Cursor::from("abc"));
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_query_result_map_keeps_completion() {
        let partial = Completion::Partial { steps_completed: 3, steps_total: 10 };
        let result = QueryResult { value: 2, completion: partial }.map(|v| v * 2);
        assert_eq!(result.value, 4);
        assert!(!result.is_complete());
    }
}
