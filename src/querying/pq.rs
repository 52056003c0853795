//! PowerQuery (parameterized query) execution with plot or table results

use crate::core::{DynamicValue, QueryRequest, QueryType};
use crate::error::{LrqError, Result};
use crate::querying::plot::PlotData;
use crate::querying::query_processing::{decode_data, to_unix_seconds, QueryMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PqResultType {
    Plot,
    Table,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PqRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    pq: PqOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PqOptions<'a> {
    query: &'a str,
    result_type: PqResultType,
}

fn build_pq_request(
    query: &str,
    result_type: PqResultType,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
) -> Result<QueryRequest> {
    if query.trim().is_empty() {
        return Err(LrqError::InvalidRequest("PowerQuery text must not be empty".to_string()));
    }
    let payload = PqRequest {
        query_type: QueryType::Pq,
        start_time: to_unix_seconds(start_time),
        end_time: to_unix_seconds(end_time),
        pq: PqOptions { query, result_type },
    };
    QueryRequest::from_payload(QueryType::Pq, &payload)
}

/// PowerQuery whose result is a plot.
#[derive(Debug, Clone, Default)]
pub struct PqPlotQuery {
    pub query: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl PqPlotQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }
}

impl QueryMapper for PqPlotQuery {
    type Response = PlotData;

    fn query_type(&self) -> QueryType {
        QueryType::Pq
    }

    fn build_request(&self) -> Result<QueryRequest> {
        build_pq_request(&self.query, PqResultType::Plot, self.start_time, self.end_time)
    }

    fn decode_response(&self, data: &[u8]) -> Result<PlotData> {
        decode_data(data)
    }
}

/// PowerQuery whose result is a table.
#[derive(Debug, Clone, Default)]
pub struct PqTableQuery {
    pub query: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl PqTableQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PqColumn {
    pub name: String,
    #[serde(rename = "cellType")]
    pub cell_type: String,
}

/// Tabular PowerQuery result. Each row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PqTable {
    pub values: Vec<Vec<DynamicValue>>,
    pub columns: Vec<PqColumn>,
    pub warnings: Vec<String>,
}

impl PqTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&DynamicValue>> {
        let index = self.column_index(name)?;
        Some(self.values.iter().filter_map(|row| row.get(index)).collect())
    }
}

impl QueryMapper for PqTableQuery {
    type Response = PqTable;

    fn query_type(&self) -> QueryType {
        QueryType::Pq
    }

    fn build_request(&self) -> Result<QueryRequest> {
        build_pq_request(&self.query, PqResultType::Table, self.start_time, self.end_time)
    }

    fn decode_response(&self, data: &[u8]) -> Result<PqTable> {
        decode_data(data)
    }
}
