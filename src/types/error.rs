use thiserror::Error;

/// worklog-pivot error types
#[derive(Error, Debug)]
pub enum WorklogError {
    /// Remote request failed (connect, timeout, non-success status)
    #[error("http error: {0}")]
    Http(String),

    /// Remote answered with a non-success status
    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },

    /// Failed to parse a remote response or a local value
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// CSV/XLSX serialization failed
    #[error("export error: {0}")]
    Export(String),

    /// No filter was supplied at all
    #[error("a filter is required")]
    MissingFilter,

    /// Filter lacks one or both range bounds
    #[error("both from and to dates are required")]
    MissingDateRange,

    /// `from` is after `to`
    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },
}

impl WorklogError {
    /// Whether a retry of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            WorklogError::Http(_) => true,
            WorklogError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for WorklogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            WorklogError::Parse(e.to_string())
        } else if e.is_builder() {
            WorklogError::Config(e.to_string())
        } else {
            WorklogError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for WorklogError {
    fn from(e: serde_json::Error) -> Self {
        WorklogError::Parse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for WorklogError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        WorklogError::Export(e.to_string())
    }
}

/// Result type alias for worklog-pivot
pub type Result<T> = std::result::Result<T, WorklogError>;
