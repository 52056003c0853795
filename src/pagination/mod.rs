//! Forward pagination of log query results with boundary deduplication

pub mod cursor;

pub use cursor::{dedup_page, fetch_log_page, is_boundary_echo, LogPage, LogPaginator};
