//! Paginated worklog retrieval
//!
//! Walks the issue search page by page, then reads each issue's worklogs
//! either from the embedded list or, when the issue reports more worklogs
//! than a search hit embeds, from the per-issue worklog endpoint. All
//! requests are issued sequentially.
//!
//! A failed request ends only the path it belongs to: a search failure
//! stops the issue walk, a per-issue failure stops that issue. Entries
//! gathered so far are kept and each failure is recorded in the outcome.

use serde::{Deserialize, Serialize};

use crate::services::client::{StartedWindow, TrackerApi, SEARCH_FIELDS};
use crate::services::cursor::{OffsetWindow, PageCursor, SearchMode};
use crate::services::query::build_query;
use crate::types::{FilterSpec, Issue, IssueContext, WorklogEntry};

/// Tunables of the remote paging contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub mode: SearchMode,
    pub search_page_size: u64,
    pub worklog_page_size: u64,
    /// Largest worklog count a search hit embeds completely
    pub embedded_worklog_limit: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::Token,
            search_page_size: 100,
            worklog_page_size: 50,
            embedded_worklog_limit: 20,
        }
    }
}

/// Where a fetch path was cut short
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FetchStage {
    /// 1-based search page
    Search { page: usize },
    IssueWorklogs { issue_key: String, start_at: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    #[serde(flatten)]
    pub stage: FetchStage,
    pub reason: String,
}

/// Entries plus a record of anything that was lost on the way
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchOutcome {
    pub entries: Vec<WorklogEntry>,
    pub failures: Vec<FetchFailure>,
    pub search_pages: usize,
    pub worklog_pages: usize,
}

impl FetchOutcome {
    /// True when at least one path was truncated
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct WorklogFetcher<'a, A: TrackerApi + ?Sized> {
    api: &'a A,
    options: FetchOptions,
}

impl<'a, A: TrackerApi + ?Sized> WorklogFetcher<'a, A> {
    pub fn new(api: &'a A, options: FetchOptions) -> Self {
        Self { api, options }
    }

    /// Retrieve every worklog entry of every issue matching `spec`
    pub async fn fetch(&self, spec: &FilterSpec) -> FetchOutcome {
        let jql = build_query(spec);
        let hint = spec.date_range().ok().map(|r| StartedWindow::from(&r));
        let mut cursor = PageCursor::new(self.options.mode, self.options.search_page_size);
        let mut outcome = FetchOutcome::default();

        tracing::debug!(jql = %jql, mode = ?self.options.mode, "fetching worklogs");

        while let Some(request) = cursor.current() {
            let page_no = outcome.search_pages + 1;
            let page = match self.api.search(&jql, &request, &SEARCH_FIELDS).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(page = page_no, error = %e, "issue search failed, keeping partial result");
                    outcome.failures.push(FetchFailure {
                        stage: FetchStage::Search { page: page_no },
                        reason: e.to_string(),
                    });
                    break;
                }
            };
            outcome.search_pages = page_no;

            for issue in &page.issues {
                self.collect_issue(issue, hint, &mut outcome).await;
            }
            cursor.advance(&page);
        }

        tracing::debug!(
            entries = outcome.entries.len(),
            search_pages = outcome.search_pages,
            worklog_pages = outcome.worklog_pages,
            failures = outcome.failures.len(),
            "fetch finished"
        );
        outcome
    }

    async fn collect_issue(&self, issue: &Issue, hint: Option<StartedWindow>, outcome: &mut FetchOutcome) {
        let context = IssueContext::from(issue);
        let (total, embedded) = issue
            .fields
            .worklog
            .as_ref()
            .map(|w| (w.total, w.worklogs.as_slice()))
            .unwrap_or((0, &[][..]));

        if total > self.options.embedded_worklog_limit {
            tracing::debug!(issue = %context.key, total, "embedded worklogs truncated, paging issue");
            self.collect_overflow(&context, hint, outcome).await;
        } else {
            outcome.entries.extend(
                embedded
                    .iter()
                    .map(|raw| WorklogEntry::from_raw(raw, &context)),
            );
        }
    }

    async fn collect_overflow(
        &self,
        context: &IssueContext,
        hint: Option<StartedWindow>,
        outcome: &mut FetchOutcome,
    ) {
        let mut window = OffsetWindow::new(self.options.worklog_page_size);
        loop {
            match self.api.list_worklogs(&context.key, window, hint).await {
                Ok(page) => {
                    outcome.worklog_pages += 1;
                    outcome.entries.extend(
                        page.worklogs
                            .iter()
                            .map(|raw| WorklogEntry::from_raw(raw, context)),
                    );
                    if !window.advance(page.total, page.worklogs.len()) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(issue = %context.key, start_at = window.start_at, error = %e, "worklog listing failed, keeping partial result");
                    outcome.failures.push(FetchFailure {
                        stage: FetchStage::IssueWorklogs {
                            issue_key: context.key.clone(),
                            start_at: window.start_at,
                        },
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cursor::PageRequest;
    use crate::services::fake::{issue_with, raw_worklog, FakeTracker};
    use crate::types::{RawWorklog, NO_COMPONENT};
    use chrono::NaiveDate;

    fn logs(n: usize) -> Vec<RawWorklog> {
        (0..n)
            .map(|i| raw_worklog("Ada", &format!("2024-01-{:02}T09:00:00.000+0000", i % 28 + 1), 3600))
            .collect()
    }

    fn issues(n: usize) -> Vec<Issue> {
        (0..n)
            .map(|i| issue_with(&format!("OPS-{}", i), Some("Infra"), &logs(1), 20))
            .collect()
    }

    fn offset() -> FetchOptions {
        FetchOptions {
            mode: SearchMode::Offset,
            ..Default::default()
        }
    }

    fn ranged_spec() -> FilterSpec {
        FilterSpec {
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            ..Default::default()
        }
    }

    // ========== pagination ==========

    #[tokio::test]
    async fn test_token_pagination_237_issues_three_pages() {
        let api = FakeTracker::with_issues(issues(237));

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(api.search_count(), 3);
        assert_eq!(outcome.search_pages, 3);
        assert_eq!(outcome.entries.len(), 237);
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn test_offset_pagination_237_issues_three_pages() {
        let api = FakeTracker::with_issues(issues(237));

        let outcome = WorklogFetcher::new(&api, offset())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(api.search_count(), 3);
        assert_eq!(outcome.entries.len(), 237);
        let starts: Vec<u64> = api
            .search_calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| match r {
                PageRequest::Offset { start_at, .. } => *start_at,
                PageRequest::Token { .. } => u64::MAX,
            })
            .collect();
        assert_eq!(starts, vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_no_matches_single_request() {
        let api = FakeTracker::default();
        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;
        assert_eq!(api.search_count(), 1);
        assert!(outcome.entries.is_empty());
        assert!(!outcome.is_partial());
    }

    // ========== overflow path ==========

    #[tokio::test]
    async fn test_overflow_issue_returns_all_25() {
        let all = logs(25);
        let mut api = FakeTracker::with_issues(vec![issue_with("OPS-1", Some("Infra"), &all, 20)]);
        api.worklogs.insert("OPS-1".into(), all);

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&ranged_spec())
            .await;

        assert_eq!(outcome.entries.len(), 25);
        assert_eq!(api.worklog_count(), 1);
        let calls = api.worklog_calls.lock().unwrap();
        assert!(calls[0].2.is_some(), "date hint should be sent");
    }

    #[tokio::test]
    async fn test_overflow_pages_by_fifty() {
        let all = logs(120);
        let mut api = FakeTracker::with_issues(vec![issue_with("OPS-1", None, &all, 20)]);
        api.worklogs.insert("OPS-1".into(), all);

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(outcome.entries.len(), 120);
        assert_eq!(outcome.worklog_pages, 3);
        assert!(outcome.entries.iter().all(|e| e.component == NO_COMPONENT));
        let calls = api.worklog_calls.lock().unwrap();
        assert!(calls[0].2.is_none(), "no hint without a date range");
    }

    #[tokio::test]
    async fn test_exactly_limit_uses_embedded() {
        let api = FakeTracker::with_issues(vec![issue_with("OPS-1", None, &logs(20), 20)]);

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(outcome.entries.len(), 20);
        assert_eq!(api.worklog_count(), 0);
    }

    // ========== failures ==========

    #[tokio::test]
    async fn test_search_failure_keeps_earlier_pages() {
        let mut api = FakeTracker::with_issues(issues(237));
        api.fail_search_page = Some(2);

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(outcome.entries.len(), 100);
        assert!(outcome.is_partial());
        assert_eq!(outcome.failures[0].stage, FetchStage::Search { page: 2 });
    }

    #[tokio::test]
    async fn test_issue_failure_continues_with_other_issues() {
        let all = logs(30);
        let mut api = FakeTracker::with_issues(vec![
            issue_with("OPS-1", None, &all, 20),
            issue_with("OPS-2", None, &logs(2), 20),
        ]);
        api.worklogs.insert("OPS-1".into(), all);
        api.fail_issue = Some("OPS-1".into());

        let outcome = WorklogFetcher::new(&api, FetchOptions::default())
            .fetch(&FilterSpec::default())
            .await;

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(
            outcome.failures[0].stage,
            FetchStage::IssueWorklogs {
                issue_key: "OPS-1".into(),
                start_at: 0
            }
        );
    }

    #[test]
    fn test_failure_serializes_flat() {
        let failure = FetchFailure {
            stage: FetchStage::Search { page: 3 },
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["stage"], "search");
        assert_eq!(json["page"], 3);
        assert_eq!(json["reason"], "timeout");
    }
}
