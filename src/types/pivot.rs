//! Pivot results and their display-value rules

use chrono::NaiveDate;
use serde::Serialize;

/// Marker for a cell with no entries (distinct from zero hours)
pub const NO_DATA: &str = "-";

/// Day-matrix cells below this magnitude render blank
pub const BLANK_EPSILON: f64 = 1e-4;

pub const HOURS_PER_DAY: f64 = 8.0;

/// Column/row representation handed to display and export
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PivotTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Display value of a day-matrix cell
pub fn format_hours(cell: Option<f64>) -> String {
    match cell {
        None => NO_DATA.to_string(),
        Some(v) if v.abs() < BLANK_EPSILON => String::new(),
        Some(v) => format!("{:.2}", v),
    }
}

/// Display value of a summary cell or total
pub fn format_days(value: f64) -> String {
    if value == 0.0 {
        NO_DATA.to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// One (author, component) line of the day matrix
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayRow {
    pub author: String,
    pub component: String,
    /// One slot per `DayPivot::dates` column; `None` means no entries
    pub cells: Vec<Option<f64>>,
}

impl DayRow {
    /// Sum of the exact accumulated values
    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }
}

/// Hours per day, rows grouped by author then component
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DayPivot {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<DayRow>,
}

impl DayPivot {
    pub fn row(&self, author: &str, component: &str) -> Option<&DayRow> {
        self.rows
            .iter()
            .find(|r| r.author == author && r.component == component)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_table(&self) -> PivotTable {
        let columns = ["Author", "Component"]
            .into_iter()
            .map(String::from)
            .chain(self.dates.iter().map(|d| d.format("%Y-%m-%d").to_string()))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                [row.author.clone(), row.component.clone()]
                    .into_iter()
                    .chain(row.cells.iter().map(|c| format_hours(*c)))
                    .collect()
            })
            .collect();

        PivotTable { columns, rows }
    }
}

/// One author line of the summary, values in days
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRow {
    pub author: String,
    /// One slot per `SummaryPivot::components` column
    pub days: Vec<f64>,
    pub total: f64,
}

/// Days per author and component, with grand totals
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SummaryPivot {
    pub components: Vec<String>,
    pub rows: Vec<SummaryRow>,
    pub component_totals: Vec<f64>,
    pub grand_total: f64,
}

impl SummaryPivot {
    pub fn row(&self, author: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.author == author)
    }

    pub fn to_table(&self) -> PivotTable {
        let columns = std::iter::once("Author".to_string())
            .chain(self.components.iter().cloned())
            .chain(std::iter::once("Total Days".to_string()))
            .collect();

        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                std::iter::once(row.author.clone())
                    .chain(row.days.iter().map(|d| format_days(*d)))
                    .chain(std::iter::once(format_days(row.total)))
                    .collect()
            })
            .collect();

        rows.push(
            std::iter::once("Total".to_string())
                .chain(self.component_totals.iter().map(|t| format_days(*t)))
                .chain(std::iter::once(format_days(self.grand_total)))
                .collect(),
        );

        PivotTable { columns, rows }
    }
}
