//! `worklog-pivot report` and `worklog-pivot details`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::cli::render::render_table;
use crate::cli::Session;
use crate::services::export::{to_delimited_text, to_spreadsheet, Sheet};
use crate::services::query::{drilldown_query, drilldown_url};
use crate::services::{Report, ReportService, SearchMode};
use crate::types::{DateRange, FilterSpec, PivotTable, Result, SelectOption, WorklogError};

pub const DAY_SHEET: &str = "worklog per day";
pub const SUMMARY_SHEET: &str = "worklog summary";

/// Filter flags shared by `report` and `details`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First day, YYYY-MM-DD (defaults with --to to the current month)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Restrict to project(s) by name
    #[arg(long = "project", value_name = "NAME")]
    pub projects: Vec<String>,

    /// Restrict to component(s) by name
    #[arg(long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Restrict to worklog author(s); see `worklog-pivot authors`
    #[arg(long = "author", value_name = "ACCOUNT_ID=NAME", value_parser = parse_author)]
    pub authors: Vec<SelectOption>,

    /// Use the legacy offset-paged search endpoint
    #[arg(long)]
    pub offset_search: bool,
}

fn parse_author(raw: &str) -> std::result::Result<SelectOption, String> {
    match raw.split_once('=') {
        Some((id, name)) if !id.trim().is_empty() && !name.trim().is_empty() => {
            Ok(SelectOption::new(id.trim(), name.trim()))
        }
        _ => Err(format!(
            "expected ACCOUNT_ID=Display Name, got '{}'",
            raw
        )),
    }
}

impl FilterArgs {
    /// No dates at all means the month containing `today`; a single
    /// date is passed through and rejected by the report
    pub fn to_filter(&self, today: NaiveDate) -> FilterSpec {
        let (from_date, to_date) = match (self.from, self.to) {
            (None, None) => {
                let month = DateRange::month_of(today);
                (Some(month.from), Some(month.to))
            }
            other => other,
        };
        FilterSpec {
            from_date,
            to_date,
            projects: self.projects.iter().map(SelectOption::labelled).collect(),
            components: self.components.iter().map(SelectOption::labelled).collect(),
            authors: self.authors.clone(),
        }
    }

    fn search_mode(&self) -> Option<SearchMode> {
        self.offset_search.then_some(SearchMode::Offset)
    }
}

/// Show the per-day matrix and per-component summary
#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write the per-day matrix as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Write the summary as CSV
    #[arg(long, value_name = "PATH")]
    pub summary_csv: Option<PathBuf>,

    /// Write both tables to an XLSX workbook
    #[arg(long, value_name = "PATH")]
    pub xlsx: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    pub async fn run(self, session: &Session) -> Result<()> {
        let filter = self.filter.to_filter(Local::now().date_naive());
        let report = run_report(session, &filter, self.filter.search_mode()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(report.as_ref())?);
        } else {
            print_report(&report);
        }

        let day_table = report.day_table();
        let summary_table = report.summary_table();
        if let Some(path) = &self.csv {
            write_csv(path, &day_table).await?;
        }
        if let Some(path) = &self.summary_csv {
            write_csv(path, &summary_table).await?;
        }
        if let Some(path) = &self.xlsx {
            let bytes = to_spreadsheet(&[
                Sheet {
                    name: DAY_SHEET,
                    table: &day_table,
                },
                Sheet {
                    name: SUMMARY_SHEET,
                    table: &summary_table,
                },
            ])?;
            tokio::fs::write(path, bytes).await?;
            eprintln!("Wrote {}", path.display());
        }
        Ok(())
    }
}

/// List the worklogs behind one author/day cell, with issue-search links
#[derive(Args, Debug)]
pub struct DetailsArgs {
    /// Author display name, as shown in the report
    #[arg(long)]
    pub name: String,

    /// Day, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DetailsArgs {
    pub async fn run(self, session: &Session) -> Result<()> {
        let mut filter = self.filter.to_filter(self.date);
        if self.filter.from.is_none() && self.filter.to.is_none() {
            filter.from_date = Some(self.date);
            filter.to_date = Some(self.date);
        }
        let report = run_report(session, &filter, self.filter.search_mode()).await?;
        let details = report.details(&self.name, self.date);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&details)?);
            return Ok(());
        }
        if details.is_empty() {
            println!("No worklogs for {} on {}", self.name, self.date);
            return Ok(());
        }

        let table = PivotTable {
            columns: ["Project", "Component", "Ticket", "Hours"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows: details
                .iter()
                .map(|d| {
                    vec![
                        d.project.clone(),
                        d.component.clone(),
                        d.ticket.clone(),
                        format!("{:.2}", d.hours),
                    ]
                })
                .collect(),
        };
        print!("{}", render_table(&table, 3));

        let components: BTreeSet<&str> = details.iter().map(|d| d.component.as_str()).collect();
        let site = session.config.site_url.as_deref().unwrap_or_default();
        println!();
        for component in components {
            let jql = drilldown_query(&self.name, self.date, component);
            if let Some(url) = drilldown_url(site, &jql) {
                println!("{}: {}", component, url);
            }
        }
        Ok(())
    }
}

async fn run_report(
    session: &Session,
    filter: &FilterSpec,
    mode: Option<SearchMode>,
) -> Result<Arc<Report>> {
    let mut options = session.config.fetch_options();
    if let Some(mode) = mode {
        options.mode = mode;
    }
    let service = ReportService::new(session.api.clone(), options);
    let report = service.run(Some(filter)).await?;

    if report.is_partial() {
        eprintln!(
            "Warning: {} request(s) failed, totals may be incomplete",
            report.failures.len()
        );
        for failure in &report.failures {
            tracing::warn!(stage = ?failure.stage, reason = %failure.reason, "fetch failure");
        }
    }
    Ok(report)
}

fn print_report(report: &Report) {
    let range = match (report.filter.from_date, report.filter.to_date) {
        (Some(from), Some(to)) => format!("{} .. {}", from, to),
        _ => String::new(),
    };
    if report.day_pivot.is_empty() {
        println!("No worklogs for {}", range);
        return;
    }
    println!("Worklog per day ({})\n", range);
    print!("{}", render_table(&report.day_table(), 2));
    println!("\nWorklog summary (days)\n");
    print!("{}", render_table(&report.summary_table(), 1));
}

async fn write_csv(path: &Path, table: &PivotTable) -> Result<()> {
    let text = to_delimited_text(&table.columns, &table.rows)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| WorklogError::Export(format!("{}: {}", path.display(), e)))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
