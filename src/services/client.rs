//! Tracker REST client
//!
//! `TrackerApi` is the seam between the fetch logic and the remote
//! service. `JiraClient` implements it over reqwest with a per-request
//! timeout and bounded retry with exponential backoff for transient
//! failures (connect errors, timeouts, 429 and 5xx responses).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::services::cursor::{OffsetWindow, PageRequest};
use crate::types::{
    ComponentRecord, DateRange, ProjectRecord, ProjectSearchPage, Result, SearchPage,
    UserRecord, WorklogError, WorklogPage,
};

/// Issue fields requested from search; everything the report reads
pub const SEARCH_FIELDS: [&str; 5] = ["key", "summary", "worklog", "project", "components"];

/// Requested project page size; the server may cap it lower
const PROJECT_PAGE_SIZE: u64 = 50;

/// Who is calling and against which site. Passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub site_url: String,
    pub email: String,
    pub api_token: String,
}

impl RequestContext {
    /// Site URL normalized to end in `/` so relative joins keep any path prefix
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.site_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
            .map_err(|e| WorklogError::Config(format!("invalid site url {}: {}", self.site_url, e)))
    }
}

/// Server-side `started` hint window, epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartedWindow {
    pub after_ms: i64,
    pub before_ms: i64,
}

impl From<&DateRange> for StartedWindow {
    fn from(range: &DateRange) -> Self {
        Self {
            after_ms: range.start_instant().timestamp_millis(),
            before_ms: range.end_instant().timestamp_millis(),
        }
    }
}

/// Remote operations the report depends on
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// One page of issues matching `jql`
    async fn search(&self, jql: &str, page: &PageRequest, fields: &[&str]) -> Result<SearchPage>;

    /// One page of an issue's worklogs
    async fn list_worklogs(
        &self,
        issue_key: &str,
        window: OffsetWindow,
        hint: Option<StartedWindow>,
    ) -> Result<WorklogPage>;

    async fn projects(&self) -> Result<Vec<ProjectRecord>>;

    async fn components(&self, project_id: &str) -> Result<Vec<ComponentRecord>>;

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<UserRecord>>;
}

/// Retry budget for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenSearchBody<'a> {
    jql: &'a str,
    max_results: u64,
    fields: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<&'a str>,
}

/// reqwest-backed `TrackerApi`
pub struct JiraClient {
    http: reqwest::Client,
    context: RequestContext,
    base: Url,
    retry: RetryPolicy,
}

impl JiraClient {
    pub fn new(context: RequestContext, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let base = context.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorklogError::Http(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            http,
            context,
            base,
            retry,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| WorklogError::Config(format!("invalid api path {}: {}", path, e)))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.context.email, Some(&self.context.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// One send; any error says via `is_transient` whether to try again
    async fn attempt<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorklogError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send with retry. The builder is cloned per attempt.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let mut attempt = 0;
        loop {
            let this_try = request
                .try_clone()
                .ok_or_else(|| WorklogError::Http("request cannot be retried".into()))?;

            match Self::attempt(this_try).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(attempt = attempt + 1, ?delay, error = %e, "retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl TrackerApi for JiraClient {
    async fn search(&self, jql: &str, page: &PageRequest, fields: &[&str]) -> Result<SearchPage> {
        let request = match page {
            PageRequest::Token { token, page_size } => {
                let body = TokenSearchBody {
                    jql,
                    max_results: *page_size,
                    fields,
                    next_page_token: token.as_deref(),
                };
                self.http.post(self.url("rest/api/3/search/jql")?).json(&body)
            }
            PageRequest::Offset {
                start_at,
                page_size,
            } => self.http.get(self.url("rest/api/3/search")?).query(&[
                ("jql", jql.to_string()),
                ("fields", fields.join(",")),
                ("startAt", start_at.to_string()),
                ("maxResults", page_size.to_string()),
            ]),
        };

        tracing::debug!(?page, "searching issues");
        self.execute(self.authorized(request)).await
    }

    async fn list_worklogs(
        &self,
        issue_key: &str,
        window: OffsetWindow,
        hint: Option<StartedWindow>,
    ) -> Result<WorklogPage> {
        let url = self.url(&format!("rest/api/3/issue/{}/worklog", issue_key))?;
        let mut params = Vec::with_capacity(4);
        if let Some(hint) = hint {
            params.push(("startedAfter", hint.after_ms.to_string()));
            params.push(("startedBefore", hint.before_ms.to_string()));
        }
        params.push(("startAt", window.start_at.to_string()));
        params.push(("maxResults", window.page_size.to_string()));

        tracing::debug!(issue = issue_key, start_at = window.start_at, "listing worklogs");
        self.execute(self.authorized(self.http.get(url).query(&params)))
            .await
    }

    async fn projects(&self) -> Result<Vec<ProjectRecord>> {
        let url = self.url("rest/api/3/project/search")?;
        let mut projects = Vec::new();
        let mut start_at: u64 = 0;
        loop {
            let page: ProjectSearchPage = self
                .execute(self.authorized(self.http.get(url.clone()).query(&[
                    ("startAt", start_at.to_string()),
                    ("maxResults", PROJECT_PAGE_SIZE.to_string()),
                ])))
                .await?;
            let received = page.values.len() as u64;
            projects.extend(page.values);

            let reached_total = page.total.is_some_and(|t| projects.len() as u64 >= t);
            if page.is_last || received == 0 || reached_total {
                break;
            }
            start_at = page.start_at + received;
            tracing::debug!(start_at, "fetching next project page");
        }
        Ok(projects)
    }

    async fn components(&self, project_id: &str) -> Result<Vec<ComponentRecord>> {
        let url = self.url(&format!("rest/api/3/project/{}/components", project_id))?;
        self.execute(self.authorized(self.http.get(url))).await
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<UserRecord>> {
        let url = self.url("rest/api/3/user/search")?;
        self.execute(self.authorized(self.http.get(url).query(&[
            ("query", query.to_string()),
            ("maxResults", max_results.to_string()),
        ])))
        .await
    }
}
