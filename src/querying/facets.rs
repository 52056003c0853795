//! Facet queries: the most frequent facets, and the values of one facet

use crate::core::{DynamicValue, QueryRequest, QueryType};
use crate::error::Result;
use crate::querying::query_processing::{decode_data, to_unix_seconds, QueryMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One value of a facet with its occurrence count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetValueCount {
    pub count: u64,
    pub value: DynamicValue,
}

/// Most frequent facets among the matching events.
#[derive(Debug, Clone, Default)]
pub struct TopFacetsQuery {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub num_values_per_facet: Option<u32>,
    pub num_facets: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopFacetsRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    top_facets: TopFacetsOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopFacetsOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(rename = "numValuesToReturnPerFacet", skip_serializing_if = "Option::is_none")]
    num_values_per_facet: Option<u32>,
    #[serde(rename = "numFacetsToReturn", skip_serializing_if = "Option::is_none")]
    num_facets: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopFacet {
    pub name: String,
    pub match_count: f64,
    #[serde(rename = "uniqueValuesCount")]
    pub unique_count: u64,
    pub values: Vec<FacetValueCount>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct TopFacetsData {
    facets: Vec<TopFacet>,
}

impl QueryMapper for TopFacetsQuery {
    type Response = Vec<TopFacet>;

    fn query_type(&self) -> QueryType {
        QueryType::TopFacets
    }

    fn build_request(&self) -> Result<QueryRequest> {
        let payload = TopFacetsRequest {
            query_type: self.query_type(),
            start_time: to_unix_seconds(self.start_time),
            end_time: to_unix_seconds(self.end_time),
            top_facets: TopFacetsOptions {
                filter: self.filter.as_deref(),
                num_values_per_facet: self.num_values_per_facet,
                num_facets: self.num_facets,
            },
        };
        QueryRequest::from_payload(self.query_type(), &payload)
    }

    fn decode_response(&self, data: &[u8]) -> Result<Vec<TopFacet>> {
        decode_data::<TopFacetsData>(data).map(|data| data.facets)
    }
}

/// Distinct values of one named facet.
#[derive(Debug, Clone, Default)]
pub struct FacetValuesQuery {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub filter: Option<String>,
    pub max_values: Option<u32>,
}

impl FacetValuesQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FacetValuesRequest<'a> {
    query_type: QueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    facet_values: FacetValuesOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FacetValuesOptions<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_values: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetValuesData {
    pub match_count: f64,
    #[serde(rename = "uniqueValuesCount")]
    pub unique_count: u64,
    pub values: Vec<FacetValueCount>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FacetValuesEnvelope {
    facet: FacetValuesData,
}

impl QueryMapper for FacetValuesQuery {
    type Response = FacetValuesData;

    fn query_type(&self) -> QueryType {
        QueryType::FacetValues
    }

    fn build_request(&self) -> Result<QueryRequest> {
        let payload = FacetValuesRequest {
            query_type: self.query_type(),
            start_time: to_unix_seconds(self.start_time),
            end_time: to_unix_seconds(self.end_time),
            facet_values: FacetValuesOptions {
                name: &self.name,
                filter: self.filter.as_deref(),
                max_values: self.max_values,
            },
        };
        QueryRequest::from_payload(self.query_type(), &payload)
    }

    fn decode_response(&self, data: &[u8]) -> Result<FacetValuesData> {
        decode_data::<FacetValuesEnvelope>(data).map(|envelope| envelope.facet)
    }
}
