//! JQL construction for the report search and cell drill-down

use chrono::NaiveDate;
use reqwest::Url;

use crate::types::{FilterSpec, SelectOption};

/// Quote a value as a JQL string literal
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn in_clause(field: &str, values: &[SelectOption], pick: fn(&SelectOption) -> &str) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let quoted: Vec<String> = values.iter().map(|v| quote(pick(v))).collect();
    Some(format!("{} in ({})", field, quoted.join(",")))
}

/// Build the conjunctive search predicate.
///
/// Clause order is fixed: project, component, worklog author, worklog date.
/// A clause is omitted iff its list is empty; the date clause needs both
/// bounds. Projects and components are matched by label, authors by account id.
/// An unconstrained filter yields an empty string.
pub fn build_query(spec: &FilterSpec) -> String {
    let date_clause = match (spec.from_date, spec.to_date) {
        (Some(from), Some(to)) => Some(format!(
            "worklogDate >= {} AND worklogDate <= {}",
            quote(&from.to_string()),
            quote(&to.to_string())
        )),
        _ => None,
    };

    [
        in_clause("project", &spec.projects, |o| &o.label),
        in_clause("component", &spec.components, |o| &o.label),
        in_clause("worklogAuthor", &spec.authors, |o| &o.id),
        date_clause,
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" AND ")
}

/// Predicate listing the issues behind one day-matrix cell
pub fn drilldown_query(author: &str, date: NaiveDate, component: &str) -> String {
    format!(
        "worklogAuthor={} AND worklogDate={} AND component={} ORDER BY created ASC",
        quote(author),
        quote(&date.to_string()),
        quote(component)
    )
}

/// Issue-navigator link for a drill-down query
pub fn drilldown_url(site_url: &str, jql: &str) -> Option<Url> {
    let mut url = Url::parse(site_url).ok()?.join("issues/").ok()?;
    url.query_pairs_mut().append_pair("jql", jql);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_empty_spec_yields_empty_query() {
        assert_eq!(build_query(&FilterSpec::default()), "");
    }

    #[test]
    fn test_full_spec_clause_order() {
        let spec = FilterSpec {
            from_date: Some(d(2024, 1, 1)),
            to_date: Some(d(2024, 1, 31)),
            projects: vec![SelectOption::new("10", "Ops"), SelectOption::new("11", "Web")],
            components: vec![SelectOption::new("7", "Infra")],
            authors: vec![SelectOption::new("acc-1", "Ada")],
        };

        assert_eq!(
            build_query(&spec),
            "project in (\"Ops\",\"Web\") AND component in (\"Infra\") \
             AND worklogAuthor in (\"acc-1\") \
             AND worklogDate >= \"2024-01-01\" AND worklogDate <= \"2024-01-31\""
        );
    }

    #[test]
    fn test_omits_empty_lists() {
        let spec = FilterSpec {
            components: vec![SelectOption::labelled("Infra")],
            ..Default::default()
        };
        assert_eq!(build_query(&spec), "component in (\"Infra\")");
    }

    #[test]
    fn test_date_clause_needs_both_bounds() {
        let spec = FilterSpec {
            from_date: Some(d(2024, 1, 1)),
            projects: vec![SelectOption::labelled("Ops")],
            ..Default::default()
        };
        assert_eq!(build_query(&spec), "project in (\"Ops\")");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let spec = FilterSpec {
            projects: vec![SelectOption::labelled("The \"Big\" One")],
            ..Default::default()
        };
        assert_eq!(build_query(&spec), r#"project in ("The \"Big\" One")"#);
    }

    #[test]
    fn test_drilldown_query_and_url() {
        let jql = drilldown_query("Ada L", d(2024, 1, 2), "Infra");
        assert_eq!(
            jql,
            "worklogAuthor=\"Ada L\" AND worklogDate=\"2024-01-02\" AND component=\"Infra\" ORDER BY created ASC"
        );

        let url = drilldown_url("https://acme.atlassian.net/", &jql).unwrap();
        assert!(url.as_str().starts_with("https://acme.atlassian.net/issues/?jql="));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_drilldown_url_rejects_garbage_site() {
        assert!(drilldown_url("not a url", "x").is_none());
    }
}
