//! Selectable filter values: projects, components and human users

use crate::services::client::TrackerApi;
use crate::types::{ComponentRecord, ProjectRecord, Result, SelectOption, UserRecord};

/// Default page size of the user lookup
pub const USER_SEARCH_LIMIT: u32 = 50;

/// User search rejects an empty query; this matches nearly every account
pub const DEFAULT_USER_QUERY: &str = "a";

impl From<ProjectRecord> for SelectOption {
    fn from(p: ProjectRecord) -> Self {
        SelectOption::new(p.id, p.name)
    }
}

impl From<ComponentRecord> for SelectOption {
    fn from(c: ComponentRecord) -> Self {
        SelectOption::new(c.id, c.name)
    }
}

impl From<UserRecord> for SelectOption {
    fn from(u: UserRecord) -> Self {
        SelectOption::new(u.account_id, u.display_name)
    }
}

pub async fn project_options<A: TrackerApi + ?Sized>(api: &A) -> Result<Vec<SelectOption>> {
    Ok(api.projects().await?.into_iter().map(Into::into).collect())
}

pub async fn component_options<A: TrackerApi + ?Sized>(
    api: &A,
    project_id: &str,
) -> Result<Vec<SelectOption>> {
    Ok(api
        .components(project_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Human accounts matching `query`; service and app accounts are excluded.
/// A blank query searches with `DEFAULT_USER_QUERY`.
pub async fn author_options<A: TrackerApi + ?Sized>(
    api: &A,
    query: &str,
    max_results: u32,
) -> Result<Vec<SelectOption>> {
    let query = match query.trim() {
        "" => DEFAULT_USER_QUERY,
        q => q,
    };
    Ok(api
        .search_users(query, max_results)
        .await?
        .into_iter()
        .filter(UserRecord::is_human)
        .map(Into::into)
        .collect())
}
