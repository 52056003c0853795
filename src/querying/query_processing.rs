use crate::core::{QueryRequest, QueryType};
use crate::error::{LrqError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Shapes one query type's request and decodes its response.
///
/// Mappers never touch the transport: the executor receives the
/// [`QueryRequest`] and hands back the raw `data` payload.
pub trait QueryMapper {
    type Response;

    fn query_type(&self) -> QueryType;

    /// Validate the parameters and serialize the request body.
    fn build_request(&self) -> Result<QueryRequest>;

    /// Decode the raw `data` payload of a finished (or partial) query.
    fn decode_response(&self, data: &[u8]) -> Result<Self::Response>;
}

/// Decode a `data` payload, treating `null` as the type's default.
///
/// A query cancelled before the server produced anything has no data yet.
pub fn decode_data<T: DeserializeOwned + Default>(data: &[u8]) -> Result<T> {
    let trimmed = data.trim_ascii();
    if trimmed.is_empty() || trimmed == b"null" {
        return Ok(T::default());
    }
    serde_json::from_slice(trimmed).map_err(|e| LrqError::Decode(format!("invalid query result: {}", e)))
}

/// Query time bounds go over the wire as Unix seconds.
pub fn to_unix_seconds(time: Option<DateTime<Utc>>) -> Option<i64> {
    time.map(|t| t.timestamp())
}
