//! Report cycle: fetch, trim to range, aggregate, publish
//!
//! Each call to `ReportService::run` is one cycle, tagged with a
//! generation number taken when it starts. Cycles are not cancelled when
//! a newer one begins; instead a finished cycle is published only if no
//! newer cycle has started meanwhile, so watchers only ever see the
//! result of the most recently started cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;

use crate::services::client::TrackerApi;
use crate::services::fetcher::{FetchFailure, FetchOptions, WorklogFetcher};
use crate::services::range_filter::RangeFilter;
use crate::services::Aggregator;
use crate::types::{
    DayPivot, FilterSpec, PivotTable, Result, SummaryPivot, WorklogDetail, WorklogEntry,
    WorklogError,
};

/// Aggregated view of one filter
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generation: u64,
    pub filter: FilterSpec,
    pub entries: Vec<WorklogEntry>,
    pub day_pivot: DayPivot,
    pub summary_pivot: SummaryPivot,
    /// Fetch paths cut short; non-empty means the pivots may be incomplete
    pub failures: Vec<FetchFailure>,
}

impl Report {
    pub fn build(
        generation: u64,
        filter: FilterSpec,
        entries: Vec<WorklogEntry>,
        failures: Vec<FetchFailure>,
    ) -> Self {
        Self {
            generation,
            filter,
            day_pivot: Aggregator::day_pivot(&entries),
            summary_pivot: Aggregator::summary_pivot(&entries),
            entries,
            failures,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn day_table(&self) -> PivotTable {
        self.day_pivot.to_table()
    }

    pub fn summary_table(&self) -> PivotTable {
        self.summary_pivot.to_table()
    }

    pub fn details(&self, author: &str, date: NaiveDate) -> Vec<WorklogDetail> {
        Aggregator::details(&self.entries, author, date)
    }
}

pub struct ReportService<A: TrackerApi + ?Sized> {
    api: Arc<A>,
    options: FetchOptions,
    generation: AtomicU64,
    published: watch::Sender<Option<Arc<Report>>>,
}

impl<A: TrackerApi + ?Sized> ReportService<A> {
    pub fn new(api: Arc<A>, options: FetchOptions) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            api,
            options,
            generation: AtomicU64::new(0),
            published,
        }
    }

    /// Receive every report that becomes current
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Report>>> {
        self.published.subscribe()
    }

    /// Currently published report, if any
    pub fn current(&self) -> Option<Arc<Report>> {
        self.published.borrow().clone()
    }

    /// Run one cycle for `filter`.
    ///
    /// `None` or a filter without both dates is an error, distinct from a
    /// report with no rows. Fetch failures do not fail the cycle; they are
    /// carried in `Report::failures`.
    pub async fn run(&self, filter: Option<&FilterSpec>) -> Result<Arc<Report>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let filter = filter.ok_or(WorklogError::MissingFilter)?;
        let range = filter.date_range()?;

        let outcome = WorklogFetcher::new(self.api.as_ref(), self.options)
            .fetch(filter)
            .await;
        let fetched = outcome.entries.len();
        let entries = RangeFilter::new(range)
            .with_authors(filter.author_labels())
            .apply(outcome.entries);

        tracing::info!(
            generation,
            fetched,
            kept = entries.len(),
            failures = outcome.failures.len(),
            "report cycle finished"
        );

        let report = Arc::new(Report::build(
            generation,
            filter.clone(),
            entries,
            outcome.failures,
        ));
        if !self.publish(report.clone()) {
            tracing::debug!(generation, "newer cycle started, result not published");
        }
        Ok(report)
    }

    /// Publish unless a newer cycle has started or been published
    fn publish(&self, report: Arc<Report>) -> bool {
        let latest_started = self.generation.load(Ordering::SeqCst);
        self.published.send_if_modified(|current| {
            let newer_shown = current
                .as_ref()
                .is_some_and(|shown| shown.generation > report.generation);
            if report.generation != latest_started || newer_shown {
                return false;
            }
            *current = Some(report);
            true
        })
    }
}
