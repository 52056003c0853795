//! Time-series plot queries

use crate::core::{QueryRequest, QueryType};
use crate::error::{LrqError, Result};
use crate::querying::query_processing::{decode_data, to_unix_seconds, QueryMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const PLOT_FREQUENCY: &str = "LOW";

/// Plot of a numeric expression over time.
///
/// Exactly one of `slices` and `slice_width` must be set.
#[derive(Debug, Clone, Default)]
pub struct PlotQuery {
    pub expression: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub slices: Option<u32>,
    pub slice_width: Option<String>,
    pub breakdown_facet: Option<String>,
}

impl PlotQuery {
    pub fn new(expression: impl Into<String>) -> Self {
        Self { expression: expression.into(), ..Default::default() }
    }

    fn validate(&self) -> Result<()> {
        match (&self.slices, &self.slice_width) {
            (None, None) => Err(LrqError::InvalidRequest(
                "either slices or slice width must be defined".to_string(),
            )),
            (Some(_), Some(_)) => Err(LrqError::InvalidRequest(
                "slices and slice width cannot both be defined".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlotRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    plot: PlotOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlotOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slice_width: Option<&'a str>,
    expression: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown_facet: Option<&'a str>,
    frequency: &'static str,
}

/// One plotted series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSeries {
    pub label: Option<String>,
    pub samples: Vec<f64>,
}

/// Plot result shared by plot and PowerQuery plot queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotData {
    pub x_axis: Vec<i64>,
    pub plots: Vec<PlotSeries>,
}

impl QueryMapper for PlotQuery {
    type Response = PlotData;

    fn query_type(&self) -> QueryType {
        QueryType::Plot
    }

    fn build_request(&self) -> Result<QueryRequest> {
        self.validate()?;

        let payload = PlotRequest {
            query_type: self.query_type(),
            start_time: to_unix_seconds(self.start_time),
            end_time: to_unix_seconds(self.end_time),
            plot: PlotOptions {
                filter: self.filter.as_deref(),
                slices: self.slices,
                slice_width: self.slice_width.as_deref(),
                expression: &self.expression,
                breakdown_facet: self.breakdown_facet.as_deref(),
                frequency: PLOT_FREQUENCY,
            },
        };
        QueryRequest::from_payload(self.query_type(), &payload)
    }

    fn decode_response(&self, data: &[u8]) -> Result<PlotData> {
        decode_data(data)
    }
}
