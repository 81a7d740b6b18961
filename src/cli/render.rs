//! Plain-text table layout for terminal output

use unicode_width::UnicodeWidthStr;

use crate::types::PivotTable;

const GAP: &str = "  ";

/// Left-aligned label columns, right-aligned value columns
pub fn render_table(table: &PivotTable, label_columns: usize) -> String {
    let column_count = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.columns.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; column_count];
    for line in std::iter::once(&table.columns).chain(table.rows.iter()) {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    let header = format_line(&table.columns, &widths, label_columns);
    let rule_len = header.width();
    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&format_line(row, &widths, label_columns));
        out.push('\n');
    }
    out
}

fn format_line(cells: &[String], widths: &[usize], label_columns: usize) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let pad = " ".repeat(widths[i].saturating_sub(cell.width()));
            if i < label_columns {
                format!("{}{}", cell, pad)
            } else {
                format!("{}{}", pad, cell)
            }
        })
        .collect();
    padded.join(GAP).trim_end().to_string()
}
