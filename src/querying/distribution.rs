//! Distribution (histogram) queries

use crate::core::{QueryRequest, QueryType};
use crate::error::Result;
use crate::querying::query_processing::{decode_data, to_unix_seconds, QueryMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Histogram of a numeric facet over the matching events.
#[derive(Debug, Clone, Default)]
pub struct DistributionQuery {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub facet: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DistributionRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    distribution: DistributionOptions<'a>,
}

#[derive(Serialize)]
struct DistributionOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    facet: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistributionData {
    pub positive_sample_counts: Vec<f64>,
    pub negative_sample_counts: Vec<f64>,
    pub positive_x_axis: Vec<f64>,
    pub negative_x_axis: Vec<f64>,
    pub positive_bucket_widths: Vec<f64>,
    pub negative_bucket_widths: Vec<f64>,

    pub zero_count: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p90: f64,
    pub p99: f64,
    pub p999: f64,
}

impl QueryMapper for DistributionQuery {
    type Response = DistributionData;

    fn query_type(&self) -> QueryType {
        QueryType::Distribution
    }

    fn build_request(&self) -> Result<QueryRequest> {
        let payload = DistributionRequest {
            query_type: self.query_type(),
            start_time: to_unix_seconds(self.start_time),
            end_time: to_unix_seconds(self.end_time),
            distribution: DistributionOptions {
                filter: self.filter.as_deref(),
                facet: self.facet.as_deref(),
            },
        };
        QueryRequest::from_payload(self.query_type(), &payload)
    }

    fn decode_response(&self, data: &[u8]) -> Result<DistributionData> {
        decode_data(data)
    }
}
