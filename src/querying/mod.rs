//! Query mappers
//!
//! Each query type shapes its own request body and decodes its own `data`
//! payload; the transport lifecycle is left to the executor.

pub mod distribution;
pub mod facets;
pub mod log;
pub mod plot;
pub mod pq;
pub mod query_processing;

pub use distribution::{DistributionData, DistributionQuery};
pub use facets::{FacetValueCount, FacetValuesData, FacetValuesQuery, TopFacet, TopFacetsQuery};
pub use log::{CursoredLogMatch, LogMatch, LogQuery};
pub use plot::{PlotData, PlotQuery, PlotSeries};
pub use pq::{PqColumn, PqPlotQuery, PqResultType, PqTable, PqTableQuery};
pub use query_processing::QueryMapper;
