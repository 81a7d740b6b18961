//! Services for fetching, filtering, aggregating and exporting worklogs

pub mod aggregator;
pub mod catalog;
pub mod client;
pub mod config;
pub mod cursor;
pub mod export;
pub mod fetcher;
pub mod query;
pub mod range_filter;
pub mod report;

#[cfg(test)]
pub(crate) mod fake;

pub use aggregator::Aggregator;
pub use client::{JiraClient, RequestContext, RetryPolicy, TrackerApi};
pub use config::{Config, ConfigService};
pub use cursor::{PageCursor, SearchMode};
pub use fetcher::{FetchFailure, FetchOptions, FetchOutcome, WorklogFetcher};
pub use query::build_query;
pub use range_filter::{filter_by_range, RangeFilter};
pub use report::{Report, ReportService};
