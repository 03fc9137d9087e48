//! Timekeeping exports: punch rows per employee, grouped into daily hours and
//! headcount, plus the cost summary that yields an average hourly rate.

use super::dated_rows;
use crate::classifier::is_summary_row;
use crate::document::{decode_document, CellValue, RawSheet};
use crate::error::Result;
use crate::header_map::HeaderMap;
use crate::locator::{locate, NamedRow, DEFAULT_HEADER_KEYWORDS};
use crate::schema::{DailyLabourMetric, LabourRateSummary};
use crate::utils::round2;
use crate::values::{parse_hours_duration, parse_locale_number};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimekeepingField {
    Employee,
    Date,
    Hours,
    Cost,
    Start,
    End,
}

const TIMEKEEPING_ALIASES: &[(TimekeepingField, &[&str])] = &[
    (
        TimekeepingField::Employee,
        &["Medewerker", "Naam", "Werknemer", "Employee", "Name"],
    ),
    (TimekeepingField::Date, &["Datum", "Dienstdatum", "Date", "Shift Date"]),
    (
        TimekeepingField::Hours,
        &["Uren", "Gewerkte Uren", "Totaal Uren", "Duur", "Hours", "Worked Hours"],
    ),
    (
        TimekeepingField::Cost,
        &["Kosten", "Loonkosten", "Totaal Kosten", "Cost", "Labour Cost"],
    ),
    (TimekeepingField::Start, &["Begin", "Starttijd", "Start", "Clock In"]),
    (TimekeepingField::End, &["Eind", "Eindtijd", "End", "Clock Out"]),
];

pub const TIMEKEEPING_HEADERS: HeaderMap<TimekeepingField> =
    HeaderMap::new(TIMEKEEPING_ALIASES);

const TIMEKEEPING_HEADER_KEYWORDS: &[&str] = &["medewerker", "employee", "kosten", "cost"];

const HOURS_PER_DAY: f64 = 24.0;

fn header_keywords() -> Vec<&'static str> {
    DEFAULT_HEADER_KEYWORDS
        .iter()
        .chain(TIMEKEEPING_HEADER_KEYWORDS)
        .copied()
        .collect()
}

/// Serial of a workbook date-time cell that carries a calendar day.
fn punch_timestamp(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::DateTime {
            serial,
            is_duration: false,
        } if *serial >= 1.0 && serial.is_finite() => Some(*serial),
        _ => None,
    }
}

/// Time of day of a punch cell in hours. Full date-times contribute only
/// their clock part.
fn punch_clock(cell: &CellValue) -> Option<f64> {
    match punch_timestamp(cell) {
        Some(serial) => Some(serial.fract() * HOURS_PER_DAY),
        None => parse_hours_duration(cell),
    }
}

/// Hours worked on a punch row: the hours column, or end minus start. Two
/// full date-times are subtracted directly; otherwise a shift that ends
/// before it starts ran past midnight.
fn row_hours(row: &NamedRow) -> Option<f64> {
    use TimekeepingField as F;

    if let Some(hours) = TIMEKEEPING_HEADERS
        .resolve(row, F::Hours)
        .and_then(parse_hours_duration)
    {
        return Some(hours.max(0.0));
    }

    let start = TIMEKEEPING_HEADERS.resolve(row, F::Start)?;
    let end = TIMEKEEPING_HEADERS.resolve(row, F::End)?;
    if let (Some(start), Some(end)) = (punch_timestamp(start), punch_timestamp(end)) {
        return Some(((end - start) * HOURS_PER_DAY).max(0.0));
    }

    let start = punch_clock(start)?;
    let end = punch_clock(end)?;
    let span = if end < start {
        end + HOURS_PER_DAY - start
    } else {
        end - start
    };
    Some(span)
}

#[derive(Debug, Default)]
struct DayLabour {
    hours: f64,
    employees: BTreeSet<String>,
}

/// Hours and distinct employees per day, ascending by date.
pub fn extract_timekeeping_daily(bytes: &[u8]) -> Result<Vec<DailyLabourMetric>> {
    let sheets = decode_document(bytes)?;
    Ok(extract_timekeeping_daily_sheets(&sheets))
}

pub fn extract_timekeeping_daily_sheets(sheets: &[RawSheet]) -> Vec<DailyLabourMetric> {
    let keywords = header_keywords();
    let mut days: BTreeMap<NaiveDate, DayLabour> = BTreeMap::new();

    for sheet in sheets {
        let table = locate(sheet, &keywords);
        let (rows, _) = dated_rows(&table, |row| {
            TIMEKEEPING_HEADERS.resolve(row, TimekeepingField::Date)
        });

        for dated in rows {
            let day = days.entry(dated.date).or_default();
            day.hours += row_hours(dated.row).unwrap_or(0.0);

            // Names are compared verbatim; "Jan" and "jan " are two people.
            if let Some(name) = TIMEKEEPING_HEADERS
                .resolve(dated.row, TimekeepingField::Employee)
                .map(|cell| cell.to_display_string())
            {
                day.employees.insert(name);
            }
        }
    }

    let metrics: Vec<DailyLabourMetric> = days
        .into_iter()
        .map(|(date, day)| DailyLabourMetric {
            date,
            hours: round2(day.hours),
            employee_count: day.employees.len() as u32,
        })
        .collect();

    info!("Timekeeping report: {} days of labour", metrics.len());
    metrics
}

/// Total cost over total hours across every non-summary row, dated or not.
/// `None` when no hours were recorded.
pub fn extract_timekeeping_rate(bytes: &[u8]) -> Result<Option<LabourRateSummary>> {
    let sheets = decode_document(bytes)?;
    Ok(extract_timekeeping_rate_sheets(&sheets))
}

pub fn extract_timekeeping_rate_sheets(sheets: &[RawSheet]) -> Option<LabourRateSummary> {
    let keywords = header_keywords();
    let mut total_cost = 0.0;
    let mut total_hours = 0.0;

    for sheet in sheets {
        let table = locate(sheet, &keywords);
        let mut summary_rows = 0usize;

        for row in &table.rows {
            if is_summary_row(row) {
                summary_rows += 1;
                continue;
            }
            total_hours += row_hours(row).unwrap_or(0.0);
            total_cost += TIMEKEEPING_HEADERS
                .resolve(row, TimekeepingField::Cost)
                .and_then(parse_locale_number)
                .unwrap_or(0.0)
                .max(0.0);
        }

        debug!(
            "Sheet '{}': {} rate rows, {} summary rows excluded",
            table.name,
            table.rows.len() - summary_rows,
            summary_rows
        );
    }

    if total_hours <= 0.0 {
        info!("Timekeeping rate report recorded no hours");
        return None;
    }

    let summary = LabourRateSummary {
        total_cost: round2(total_cost),
        total_hours: round2(total_hours),
        avg_hourly_rate: round2(total_cost / total_hours),
    };
    info!(
        "Timekeeping rate report: {:.2} hours, average rate {:.2}",
        summary.total_hours, summary.avg_hourly_rate
    );
    Some(summary)
}
