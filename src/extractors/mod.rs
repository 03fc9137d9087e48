//! Report-type extractors.
//!
//! Every extractor follows the same template: decode the document, locate
//! the header of each sheet, keep rows that carry a date and are not summary
//! lines, then map canonical fields through the report's [`HeaderMap`].
//!
//! [`HeaderMap`]: crate::header_map::HeaderMap

pub mod cost_variance;
pub mod operational;
pub mod service;
pub mod timekeeping;

use crate::classifier::is_summary_row;
use crate::document::CellValue;
use crate::locator::{NamedRow, SheetTable};
use crate::values::parse_flexible_date;
use chrono::NaiveDate;
use log::debug;

/// Row filtering counts for one sheet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowStats {
    pub total: usize,
    pub kept: usize,
    pub undated: usize,
    pub summary: usize,
}

/// A data row with its parsed date.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DatedRow<'t> {
    pub date: NaiveDate,
    pub row: &'t NamedRow,
}

/// Rows of `table` that have a date (looked up by `date_cell`) and are not
/// total/average lines, in sheet order.
pub(crate) fn dated_rows<'t, F>(
    table: &'t SheetTable,
    date_cell: F,
) -> (Vec<DatedRow<'t>>, RowStats)
where
    F: Fn(&'t NamedRow) -> Option<&'t CellValue>,
{
    let mut stats = RowStats {
        total: table.rows.len(),
        ..RowStats::default()
    };
    let mut kept = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let Some(date) = date_cell(row)
            .or_else(|| row.date_cell())
            .and_then(parse_flexible_date)
        else {
            stats.undated += 1;
            continue;
        };
        if is_summary_row(row) {
            stats.summary += 1;
            continue;
        }
        kept.push(DatedRow { date, row });
    }

    stats.kept = kept.len();
    debug!(
        "Sheet '{}': kept {} of {} rows ({} without date, {} summary)",
        table.name, stats.kept, stats.total, stats.undated, stats.summary
    );
    (kept, stats)
}
