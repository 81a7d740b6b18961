//! In-memory `TrackerApi` for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::client::{StartedWindow, TrackerApi};
use crate::services::cursor::{OffsetWindow, PageRequest};
use crate::types::{
    ComponentRecord, EmbeddedWorklogs, Issue, IssueFields, NamedRef, ProjectRecord, RawWorklog,
    Result, SearchPage, UserRecord, WorklogError, WorklogPage,
};

pub fn raw_worklog(author: &str, started: &str, seconds: u64) -> RawWorklog {
    serde_json::from_value(serde_json::json!({
        "started": started,
        "author": {"displayName": author},
        "timeSpentSeconds": seconds,
    }))
    .unwrap()
}

/// Issue whose embedded list holds at most `embedded_cap` of `worklogs`,
/// reporting the full count as total
pub fn issue_with(
    key: &str,
    component: Option<&str>,
    worklogs: &[RawWorklog],
    embedded_cap: usize,
) -> Issue {
    Issue {
        key: key.to_string(),
        fields: IssueFields {
            summary: Some(format!("Summary of {}", key)),
            project: Some(NamedRef {
                name: "Operations".into(),
            }),
            components: component
                .map(|c| vec![NamedRef { name: c.into() }])
                .unwrap_or_default(),
            worklog: Some(EmbeddedWorklogs {
                total: worklogs.len() as u64,
                worklogs: worklogs.iter().take(embedded_cap).cloned().collect(),
            }),
        },
    }
}

#[derive(Default)]
pub struct FakeTracker {
    pub issues: Vec<Issue>,
    /// Full worklog lists served by the per-issue endpoint
    pub worklogs: HashMap<String, Vec<RawWorklog>>,
    /// 1-based search page that fails
    pub fail_search_page: Option<usize>,
    pub fail_issue: Option<String>,
    pub search_calls: Mutex<Vec<PageRequest>>,
    pub worklog_calls: Mutex<Vec<(String, u64, Option<StartedWindow>)>>,
    pub users: Vec<UserRecord>,
    pub user_queries: Mutex<Vec<String>>,
}

pub fn user(account_id: &str, name: &str, account_type: &str) -> UserRecord {
    UserRecord {
        account_id: account_id.into(),
        display_name: name.into(),
        account_type: Some(account_type.into()),
    }
}

impl FakeTracker {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            ..Default::default()
        }
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.lock().unwrap().len()
    }

    pub fn worklog_count(&self) -> usize {
        self.worklog_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TrackerApi for FakeTracker {
    async fn search(&self, _jql: &str, page: &PageRequest, _fields: &[&str]) -> Result<SearchPage> {
        let call_no = {
            let mut calls = self.search_calls.lock().unwrap();
            calls.push(page.clone());
            calls.len()
        };
        if self.fail_search_page == Some(call_no) {
            return Err(WorklogError::Http("503 from fake".into()));
        }

        let size = page.page_size() as usize;
        let start = match page {
            PageRequest::Token { token, .. } => token
                .as_deref()
                .map(|t| t.parse::<usize>().unwrap())
                .unwrap_or(0),
            PageRequest::Offset { start_at, .. } => *start_at as usize,
        };
        let end = (start + size).min(self.issues.len());
        let issues = self.issues[start.min(end)..end].to_vec();

        Ok(match page {
            PageRequest::Token { .. } => SearchPage {
                issues,
                next_page_token: (end < self.issues.len()).then(|| end.to_string()),
                total: None,
            },
            PageRequest::Offset { .. } => SearchPage {
                issues,
                next_page_token: None,
                total: Some(self.issues.len() as u64),
            },
        })
    }

    async fn list_worklogs(
        &self,
        issue_key: &str,
        window: OffsetWindow,
        hint: Option<StartedWindow>,
    ) -> Result<WorklogPage> {
        self.worklog_calls
            .lock()
            .unwrap()
            .push((issue_key.to_string(), window.start_at, hint));
        if self.fail_issue.as_deref() == Some(issue_key) {
            return Err(WorklogError::Parse("truncated body".into()));
        }

        let all = self.worklogs.get(issue_key).cloned().unwrap_or_default();
        let start = (window.start_at as usize).min(all.len());
        let end = (start + window.page_size as usize).min(all.len());
        Ok(WorklogPage {
            worklogs: all[start..end].to_vec(),
            total: all.len() as u64,
        })
    }

    async fn projects(&self) -> Result<Vec<ProjectRecord>> {
        Ok(vec![ProjectRecord {
            id: "10".into(),
            name: "Operations".into(),
        }])
    }

    async fn components(&self, _project_id: &str) -> Result<Vec<ComponentRecord>> {
        Ok(vec![ComponentRecord {
            id: "7".into(),
            name: "Infra".into(),
        }])
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<UserRecord>> {
        self.user_queries.lock().unwrap().push(query.to_string());
        Ok(self
            .users
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }
}
