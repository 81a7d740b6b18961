//! Closed date-range trimming of fetched entries
//!
//! The search predicate is day-granular and the embedded-worklog path
//! ignores it entirely, so this filter is what actually enforces the
//! report boundary.

use crate::types::{DateRange, WorklogEntry};

/// Date range plus an optional author allow-list (display names)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub range: DateRange,
    pub authors: Vec<String>,
}

impl RangeFilter {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            authors: Vec::new(),
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn accepts(&self, entry: &WorklogEntry) -> bool {
        self.range.contains(entry.started_utc())
            && (self.authors.is_empty() || self.authors.iter().any(|a| *a == entry.author))
    }

    pub fn apply(&self, entries: Vec<WorklogEntry>) -> Vec<WorklogEntry> {
        entries.into_iter().filter(|e| self.accepts(e)).collect()
    }
}

/// Keep entries whose `started` instant lies in `[from 00:00:00.000Z, to 23:59:59.999Z]`
pub fn filter_by_range(entries: Vec<WorklogEntry>, range: DateRange) -> Vec<WorklogEntry> {
    RangeFilter::new(range).apply(entries)
}
