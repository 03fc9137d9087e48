//! Header discovery and named-row access.

use crate::document::{CellValue, RawSheet};
use crate::values::parse_flexible_date;
use log::debug;
use std::collections::HashMap;

/// Only the leading rows are searched for a header.
pub const HEADER_SCAN_ROWS: usize = 20;

/// Keywords that mark a row as the header of a daily report (Dutch and English).
pub const DEFAULT_HEADER_KEYWORDS: &[&str] = &[
    "datum", "date", "dag", "day", "omzet", "revenue", "arbeid", "labour", "labor", "uren",
    "hours",
];

/// Field name under which a mis-labeled date column is exposed.
pub const SYNTHETIC_DATE_FIELD: &str = "__date";

const EXACT_DATE_HEADERS: &[&str] = &["datum", "date"];
const DATE_HEADER_HINTS: &[&str] = &["datum", "date"];

/// Index of the first row (within the scan window) that has at least two
/// filled cells and a cell containing one of `keywords`.
pub fn find_header_row(rows: &[Vec<CellValue>], keywords: &[&str]) -> Option<usize> {
    rows.iter().take(HEADER_SCAN_ROWS).position(|row| {
        let filled = row.iter().filter(|c| !c.is_blank()).count();
        filled >= 2
            && row.iter().any(|cell| {
                let text = cell.to_display_string().trim().to_lowercase();
                !text.is_empty() && keywords.iter().any(|k| text.contains(k))
            })
    })
}

/// One data row keyed by lower-cased header text.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRow {
    pub row_index: usize,
    fields: HashMap<String, CellValue>,
    first_cell: CellValue,
}

impl NamedRow {
    /// Raw value under `header` (case-insensitive, trimmed).
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.fields.get(&header.trim().to_lowercase())
    }

    /// The exact "Datum"/"Date" column, or the detected date-like column.
    pub fn date_cell(&self) -> Option<&CellValue> {
        EXACT_DATE_HEADERS
            .iter()
            .chain(std::iter::once(&SYNTHETIC_DATE_FIELD))
            .find_map(|h| self.fields.get(*h).filter(|c| !c.is_blank()))
    }

    pub fn first_cell(&self) -> &CellValue {
        &self.first_cell
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(CellValue::is_blank)
    }
}

/// A sheet after header discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    /// `None` when no header matched and row 0 was used.
    pub header_row: Option<usize>,
    pub headers: Vec<String>,
    pub rows: Vec<NamedRow>,
}

/// Locates the header row and names every following row by it. Without a
/// recognizable header the sheet is treated as having its header at row 0.
pub fn locate(sheet: &RawSheet, keywords: &[&str]) -> SheetTable {
    let header_row = find_header_row(&sheet.rows, keywords);
    let header_index = header_row.unwrap_or(0);

    let headers: Vec<String> = sheet
        .rows
        .get(header_index)
        .map(|row| row.iter().map(|c| c.to_display_string().trim().to_string()).collect())
        .unwrap_or_default();

    let data_rows: Vec<(usize, &Vec<CellValue>)> = sheet
        .rows
        .iter()
        .enumerate()
        .skip(header_index + 1)
        .filter(|(_, row)| !row.iter().all(CellValue::is_blank))
        .collect();

    let date_column = detect_date_column(&headers, &data_rows);

    let rows = data_rows
        .into_iter()
        .map(|(row_index, row)| name_row(row_index, row, &headers, date_column))
        .collect::<Vec<_>>();

    match header_row {
        Some(idx) => debug!(
            "Sheet '{}': header at row {}, {} data rows",
            sheet.name,
            idx,
            rows.len()
        ),
        None => debug!(
            "Sheet '{}': no header keyword found, using row 0 ({} data rows)",
            sheet.name,
            rows.len()
        ),
    }

    SheetTable {
        name: sheet.name.clone(),
        header_row,
        headers,
        rows,
    }
}

fn name_row(
    row_index: usize,
    row: &[CellValue],
    headers: &[String],
    date_column: Option<usize>,
) -> NamedRow {
    let mut fields = HashMap::with_capacity(headers.len() + 1);
    for (header, cell) in headers.iter().zip(row.iter()) {
        if header.is_empty() {
            continue;
        }
        // Later duplicates overwrite earlier ones.
        fields.insert(header.to_lowercase(), cell.clone());
    }

    if let Some(cell) = date_column.and_then(|idx| row.get(idx)) {
        fields.insert(SYNTHETIC_DATE_FIELD.to_string(), cell.clone());
    }

    NamedRow {
        row_index,
        fields,
        first_cell: row.first().cloned().unwrap_or(CellValue::Empty),
    }
}

/// Column to expose as the synthetic date field, only when no header is
/// exactly "Datum"/"Date". Prefers headers that mention a date, then the
/// first column whose first filled value parses as a date.
fn detect_date_column(
    headers: &[String],
    data_rows: &[(usize, &Vec<CellValue>)],
) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    if lowered.iter().any(|h| EXACT_DATE_HEADERS.contains(&h.as_str())) {
        return None;
    }

    if let Some(idx) = lowered
        .iter()
        .position(|h| DATE_HEADER_HINTS.iter().any(|hint| h.contains(hint)))
    {
        return Some(idx);
    }

    let width = data_rows.iter().map(|(_, r)| r.len()).max().unwrap_or(0);
    (0..width).find(|&col| {
        data_rows
            .iter()
            .filter_map(|(_, row)| row.get(col))
            .find(|cell| !cell.is_blank())
            .map(looks_like_date)
            .unwrap_or(false)
    })
}

fn looks_like_date(cell: &CellValue) -> bool {
    match cell {
        CellValue::DateTime { is_duration, .. } => !is_duration,
        CellValue::Text(_) => parse_flexible_date(cell).is_some(),
        _ => false,
    }
}
