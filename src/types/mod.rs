//! Type definitions for worklog-pivot

mod error;
mod filter;
mod pivot;
mod remote;
mod worklog;

pub use error::*;
pub use filter::*;
pub use pivot::*;
pub use remote::*;
pub use worklog::*;
