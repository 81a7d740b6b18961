//! Filter criteria collected from the user

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Result, WorklogError};

/// A selectable value: remote identifier plus human label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    pub id: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Option whose id doubles as its label
    pub fn labelled(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: label.clone(),
            label,
        }
    }
}

/// Report filter. Every list may be empty, meaning unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSpec {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub projects: Vec<SelectOption>,
    #[serde(default)]
    pub components: Vec<SelectOption>,
    #[serde(default)]
    pub authors: Vec<SelectOption>,
}

/// Closed calendar-day interval, validated `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(WorklogError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// First and last day of the month containing `today`
    pub fn month_of(today: NaiveDate) -> Self {
        let from = today.with_day(1).unwrap_or(today);
        let next_month = if today.month() == 12 {
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
        };
        let to = next_month.map(|d| d - Duration::days(1)).unwrap_or(today);
        Self { from, to }
    }

    /// `from` at 00:00:00.000 UTC
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.from.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// `to` at 23:59:59.999 UTC
    pub fn end_instant(&self) -> DateTime<Utc> {
        let end_of_day = chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or(chrono::NaiveTime::MIN);
        self.to.and_time(end_of_day).and_utc()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant() && instant <= self.end_instant()
    }
}

impl FilterSpec {
    /// Both bounds present and ordered; otherwise `MissingDateRange` / `InvalidDateRange`
    pub fn date_range(&self) -> Result<DateRange> {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) => DateRange::new(from, to),
            _ => Err(WorklogError::MissingDateRange),
        }
    }

    /// Display names of selected authors, used as an allow-list
    pub fn author_labels(&self) -> Vec<String> {
        self.authors.iter().map(|a| a.label.clone()).collect()
    }
}
