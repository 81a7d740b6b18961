//! Export of pivot tables to delimited text and XLSX workbooks

use csv::{QuoteStyle, Terminator, WriterBuilder};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use unicode_width::UnicodeWidthStr;

use crate::types::{PivotTable, Result, WorklogError, NO_DATA};

/// Comma-joined header plus one comma-joined line per row.
///
/// Values are written verbatim: a label containing a comma or newline
/// will shift columns. Hour/day values never do, and labels in practice
/// don't, so nothing is quoted.
pub fn to_delimited_text(columns: &[String], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(columns)
        .map_err(|e| WorklogError::Export(e.to_string()))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| WorklogError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| WorklogError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| WorklogError::Export(e.to_string()))
}

/// One worksheet of a workbook export
#[derive(Debug, Clone, Copy)]
pub struct Sheet<'a> {
    pub name: &'a str,
    pub table: &'a PivotTable,
}

/// Spreadsheet value of a display string
#[derive(Debug, Clone, PartialEq)]
enum CellValue<'a> {
    Empty,
    Number(f64),
    Text(&'a str),
}

fn coerce(display: &str) -> CellValue<'_> {
    if display.is_empty() || display == NO_DATA {
        return CellValue::Empty;
    }
    match display.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(display),
    }
}

fn cell_values(row: &[String]) -> Vec<CellValue<'_>> {
    row.iter().map(|display| coerce(display)).collect()
}

/// Build an XLSX workbook, one worksheet per sheet, into memory
pub fn to_spreadsheet(sheets: &[Sheet<'_>]) -> Result<Vec<u8>> {
    if sheets.is_empty() {
        return Err(WorklogError::Export("no sheets to export".into()));
    }

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(0x2F75B5))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;
        write_table(worksheet, sheet.table, &header_format)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_table(worksheet: &mut Worksheet, table: &PivotTable, header_format: &Format) -> Result<()> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.width()).collect();

    for (col, label) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, label, header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row_index, row) in table.rows.iter().enumerate() {
        let row_num = (row_index + 1) as u32;
        for (col, (display, value)) in row.iter().zip(cell_values(row)).enumerate() {
            match value {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col as u16, n)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col as u16, s)?;
                }
            }
            if col >= widths.len() {
                widths.resize(col + 1, 0);
            }
            widths[col] = widths[col].max(display.width());
        }
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width as f64 + 2.0)?;
    }
    Ok(())
}
