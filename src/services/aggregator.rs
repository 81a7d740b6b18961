//! Aggregator service for building the report pivots

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::types::{
    DayPivot, DayRow, SummaryPivot, SummaryRow, WorklogDetail, WorklogEntry, HOURS_PER_DAY,
};

/// Case-insensitive ordering with lowercase-first tie break ("ada" < "Ada" < "bob")
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

/// Running state of the day-matrix fold
#[derive(Default)]
struct DayFold {
    rows: Vec<DayRow>,
    index: HashMap<(String, String), usize>,
}

/// Running state of the summary fold
#[derive(Default)]
struct SummaryFold {
    authors: Vec<String>,
    components: Vec<String>,
    days: HashMap<(String, String), f64>,
}

/// Aggregator for the report pivots
pub struct Aggregator;

impl Aggregator {
    /// Hours per (author, component) per day.
    ///
    /// Columns are the distinct entry dates, ascending. Rows are ordered by
    /// author (`locale_cmp`); an author's component rows keep the order in
    /// which they were first seen.
    pub fn day_pivot(entries: &[WorklogEntry]) -> DayPivot {
        let dates: Vec<NaiveDate> = entries
            .iter()
            .map(|e| e.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let fold = entries.iter().fold(DayFold::default(), |mut acc, entry| {
            let key = (entry.author.clone(), entry.component.clone());
            let slot = *acc.index.entry(key).or_insert_with(|| {
                acc.rows.push(DayRow {
                    author: entry.author.clone(),
                    component: entry.component.clone(),
                    cells: vec![None; dates.len()],
                });
                acc.rows.len() - 1
            });
            // dates is built from these same entries
            if let Ok(col) = dates.binary_search(&entry.date) {
                let cell = &mut acc.rows[slot].cells[col];
                *cell = Some(cell.unwrap_or(0.0) + entry.hours);
            }
            acc
        });

        let mut rows = fold.rows;
        rows.sort_by(|a, b| locale_cmp(&a.author, &b.author));

        DayPivot { dates, rows }
    }

    /// Days (hours / 8) per author and component with row, column and grand totals.
    ///
    /// Authors and components appear in first-seen order.
    pub fn summary_pivot(entries: &[WorklogEntry]) -> SummaryPivot {
        let fold = entries.iter().fold(SummaryFold::default(), |mut acc, entry| {
            if !acc.authors.contains(&entry.author) {
                acc.authors.push(entry.author.clone());
            }
            if !acc.components.contains(&entry.component) {
                acc.components.push(entry.component.clone());
            }
            *acc
                .days
                .entry((entry.author.clone(), entry.component.clone()))
                .or_insert(0.0) += entry.hours / HOURS_PER_DAY;
            acc
        });

        let value = |author: &str, component: &str| {
            fold.days
                .get(&(author.to_string(), component.to_string()))
                .copied()
                .unwrap_or(0.0)
        };

        let rows: Vec<SummaryRow> = fold
            .authors
            .iter()
            .map(|author| {
                let days: Vec<f64> = fold.components.iter().map(|c| value(author, c)).collect();
                let total = days.iter().sum();
                SummaryRow {
                    author: author.clone(),
                    days,
                    total,
                }
            })
            .collect();

        let component_totals: Vec<f64> = (0..fold.components.len())
            .map(|col| rows.iter().map(|r| r.days[col]).sum())
            .collect();
        let grand_total = component_totals.iter().sum();

        SummaryPivot {
            components: fold.components,
            rows,
            component_totals,
            grand_total,
        }
    }

    /// Entries behind one author's day, for drill-down
    pub fn details(entries: &[WorklogEntry], author: &str, date: NaiveDate) -> Vec<WorklogDetail> {
        entries
            .iter()
            .filter(|e| e.author == author && e.date == date)
            .map(WorklogDetail::from)
            .collect()
    }
}
