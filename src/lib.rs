//! Worklog reporting for an issue tracker
//!
//! Fetches worklogs matching a filter, trims them to the requested date
//! range and pivots them into an hours-per-day matrix and a
//! days-per-component summary, with CSV and XLSX export.

pub mod cli;
pub mod services;
pub mod types;
