//! Wire types of the tracker REST API (only the fields the report reads)

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Tracker timestamps look like `2024-01-01T09:00:00.000+0000`
const TRACKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

pub fn parse_tracker_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, TRACKER_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn deserialize_started<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_tracker_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid started timestamp: {}", raw)))
}

/// One page of an issue search, token- or offset-paginated
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Present on token-paginated responses while more pages remain
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Present on offset-paginated responses
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub project: Option<NamedRef>,
    #[serde(default)]
    pub components: Vec<NamedRef>,
    #[serde(default)]
    pub worklog: Option<EmbeddedWorklogs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// Worklogs embedded inline in a search hit; may be truncated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedWorklogs {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub worklogs: Vec<RawWorklog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorklog {
    #[serde(deserialize_with = "deserialize_started")]
    pub started: DateTime<FixedOffset>,
    pub author: AuthorRef,
    pub time_spent_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub display_name: String,
}

/// One page of an issue's worklog sub-resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPage {
    #[serde(default)]
    pub worklogs: Vec<RawWorklog>,
    #[serde(default)]
    pub total: u64,
}

// ========== catalog records ==========

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
}

/// One page of the project search; a missing `isLast` ends paging
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSearchPage {
    #[serde(default)]
    pub values: Vec<ProjectRecord>,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default = "last_page_default")]
    pub is_last: bool,
}

fn last_page_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub account_id: String,
    pub display_name: String,
    #[serde(default)]
    pub account_type: Option<String>,
}

impl UserRecord {
    /// Human accounts, excluding apps and customer portal users
    pub fn is_human(&self) -> bool {
        self.account_type.as_deref() == Some("atlassian")
    }
}
