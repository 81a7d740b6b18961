//! Normalized worklog entries

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use super::remote::{Issue, RawWorklog};

/// Component name used when an issue has none
pub const NO_COMPONENT: &str = "N/A";

/// Project name used when an issue carries no project
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// One time booking, flattened from a remote worklog record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorklogEntry {
    /// Calendar day of `started`, in the offset it was recorded with
    pub date: NaiveDate,
    pub author: String,
    pub project: String,
    pub component: String,
    pub hours: f64,
    pub started: DateTime<FixedOffset>,
    pub issue_key: String,
}

impl WorklogEntry {
    pub fn from_raw(raw: &RawWorklog, issue: &IssueContext) -> Self {
        Self {
            date: raw.started.date_naive(),
            author: raw.author.display_name.clone(),
            project: issue.project.clone(),
            component: issue.component.clone(),
            hours: raw.time_spent_seconds as f64 / SECONDS_PER_HOUR,
            started: raw.started,
            issue_key: issue.key.clone(),
        }
    }

    pub fn started_utc(&self) -> DateTime<Utc> {
        self.started.with_timezone(&Utc)
    }
}

/// Issue-level attributes shared by all of an issue's entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueContext {
    pub key: String,
    pub project: String,
    pub component: String,
}

impl From<&Issue> for IssueContext {
    fn from(issue: &Issue) -> Self {
        Self {
            key: issue.key.clone(),
            project: issue
                .fields
                .project
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            component: issue
                .fields
                .components
                .first()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| NO_COMPONENT.to_string()),
        }
    }
}

/// A single entry behind a drill-down cell
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorklogDetail {
    pub project: String,
    pub component: String,
    pub ticket: String,
    pub hours: f64,
}

impl From<&WorklogEntry> for WorklogDetail {
    fn from(entry: &WorklogEntry) -> Self {
        Self {
            project: entry.project.clone(),
            component: entry.component.clone(),
            ticket: entry.issue_key.clone(),
            hours: entry.hours,
        }
    }
}
