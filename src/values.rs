//! Locale-aware value normalizers.
//!
//! Every function here is total: malformed input yields `None` (or the
//! documented zero default), never a panic or an error.

use crate::document::CellValue;
use crate::utils::{round2, serial_to_date};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// All-digit text inside this range is read as a serial date
/// (roughly 1954-10 through 2119-01).
const TEXT_SERIAL_RANGE: std::ops::RangeInclusive<f64> = 20_000.0..=80_000.0;

/// Parsed dates before this year are two-digit years read as four-digit ones.
const MIN_PLAUSIBLE_YEAR: i32 = 1900;

const CURRENCY_PREFIXES: &[&str] = &["€", "EUR", "$", "£"];

/// Free-text date layouts tried after the fixed patterns, in order.
const FREE_TEXT_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
    "%d-%m-%y",
    "%d/%m/%y",
];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Dutch month names (full and abbreviated) mapped to English equivalents.
const DUTCH_MONTHS: &[(&str, &str)] = &[
    ("januari", "january"),
    ("februari", "february"),
    ("maart", "march"),
    ("april", "april"),
    ("mei", "may"),
    ("juni", "june"),
    ("juli", "july"),
    ("augustus", "august"),
    ("september", "september"),
    ("oktober", "october"),
    ("november", "november"),
    ("december", "december"),
    ("jan", "jan"),
    ("feb", "feb"),
    ("mrt", "mar"),
    ("apr", "apr"),
    ("jun", "jun"),
    ("jul", "jul"),
    ("aug", "aug"),
    ("sep", "sep"),
    ("sept", "sep"),
    ("okt", "oct"),
    ("nov", "nov"),
    ("dec", "dec"),
];

const WEEKDAY_NAMES: &[&str] = &[
    "maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag", "ma", "di",
    "wo", "do", "vr", "za", "zo", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday", "mon", "tue", "wed", "thu", "fri", "sat", "sun",
];

/// Parses a number written the Dutch way ("€ 1.545,78", "24,8%") or plainly.
/// Text results are rounded to two decimals; numeric cells pass through.
pub fn parse_locale_number(raw: &CellValue) -> Option<f64> {
    match raw {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::DateTime { serial, .. } => serial.is_finite().then_some(*serial),
        CellValue::Text(s) => parse_locale_str(s).map(round2),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

/// Unrounded text parse shared by the number and percentage normalizers.
fn parse_locale_str(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() || s.starts_with('#') {
        return None;
    }

    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    for prefix in CURRENCY_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    }
    s = s.strip_suffix('%').unwrap_or(s).trim_end();

    let compact: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if compact.is_empty() || !compact.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let normalized = if compact.contains('.') && compact.contains(',') {
        compact.replace('.', "").replace(',', ".")
    } else if compact.contains(',') {
        compact.replace(',', ".")
    } else {
        compact
    };

    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Percentage on the 0-100 scale. Values strictly between 0 and 1 are read
/// as fractions and scaled up. Unparseable input is 0.
pub fn parse_percentage(raw: &CellValue) -> f64 {
    let value = match raw {
        CellValue::Text(s) => parse_locale_str(s),
        other => parse_locale_number(other),
    };

    match value {
        Some(v) if v > 0.0 && v < 1.0 => round2(v * 100.0),
        Some(v) => round2(v),
        None => 0.0,
    }
}

/// Normalizes a date cell. Attempts, in order: serial number, `DD-MM-YYYY`,
/// `YYYY-MM-DD`, then the free-text parser.
pub fn parse_flexible_date(raw: &CellValue) -> Option<NaiveDate> {
    match raw {
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::DateTime {
            serial,
            is_duration: false,
        } => serial_to_date(*serial),
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// Formats a parsed date as `YYYY-MM-DD`.
pub fn to_iso_date(raw: &CellValue) -> Option<String> {
    parse_flexible_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(serial) = s.parse::<f64>() {
            if TEXT_SERIAL_RANGE.contains(&serial) {
                return serial_to_date(serial);
            }
        }
    }

    for format in ["%d-%m-%Y", "%Y-%m-%d"] {
        if let Some(date) = parse_plausible(s, format) {
            return Some(date);
        }
    }

    parse_free_text_date(s)
}

fn parse_plausible(s: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, format)
        .ok()
        .filter(|d| d.year() >= MIN_PLAUSIBLE_YEAR)
}

fn parse_free_text_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            if dt.year() >= MIN_PLAUSIBLE_YEAR {
                return Some(dt.date());
            }
        }
    }

    let cleaned = normalize_date_words(s);
    if cleaned.is_empty() {
        return None;
    }
    FREE_TEXT_DATE_FORMATS
        .iter()
        .find_map(|format| parse_plausible(&cleaned, format))
}

/// Lower-cases, drops weekday names and translates Dutch month names so the
/// chrono formats above can read "zondag 1 maart 2026" or "1 mrt. 2026".
fn normalize_date_words(s: &str) -> String {
    let lowered = s.to_lowercase();
    let words: Vec<String> = lowered
        .split_whitespace()
        .filter_map(|word| {
            let bare = word.trim_end_matches([',', '.']);
            if WEEKDAY_NAMES.contains(&bare) {
                return None;
            }
            let translated = DUTCH_MONTHS
                .iter()
                .find(|(dutch, _)| *dutch == bare)
                .map(|(_, english)| english.to_string());
            Some(match translated {
                Some(month) if word.ends_with(',') => format!("{},", month),
                Some(month) => month,
                None => word.to_string(),
            })
        })
        .collect();
    words.join(" ")
}

/// Hours as a decimal number, from either decimal notation or `H:MM`
/// clock-duration notation. Workbook time cells below one day are converted
/// from day fractions.
pub fn parse_hours_duration(raw: &CellValue) -> Option<f64> {
    match raw {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::DateTime { serial, .. } if *serial < 1.0 => Some(serial * 24.0),
        CellValue::DateTime { serial, .. } => serial.is_finite().then_some(*serial),
        CellValue::Text(s) if s.contains(':') => {
            let (hours, minutes, seconds) = split_clock(s)?;
            Some(hours + minutes / 60.0 + seconds / 3600.0)
        }
        other => parse_locale_number(other),
    }
}

/// Minutes as a decimal number, from decimal minutes, `MM:SS` or `HH:MM:SS`.
pub fn parse_minutes_duration(raw: &CellValue) -> Option<f64> {
    match raw {
        CellValue::DateTime { serial, .. } if *serial < 1.0 => Some(serial * 24.0 * 60.0),
        CellValue::Text(s) if s.contains(':') => {
            let parts: Vec<&str> = s.trim().split(':').collect();
            match parts.as_slice() {
                [m, sec] => Some(parse_clock_part(m)? + parse_clock_part(sec)? / 60.0),
                [h, m, sec] => Some(
                    parse_clock_part(h)? * 60.0
                        + parse_clock_part(m)?
                        + parse_clock_part(sec)? / 60.0,
                ),
                _ => None,
            }
        }
        other => parse_locale_number(other),
    }
}

/// Splits `H:MM` or `H:MM:SS`.
fn split_clock(s: &str) -> Option<(f64, f64, f64)> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    match parts.as_slice() {
        [h, m] => Some((parse_clock_part(h)?, parse_clock_part(m)?, 0.0)),
        [h, m, sec] => Some((
            parse_clock_part(h)?,
            parse_clock_part(m)?,
            parse_clock_part(sec)?,
        )),
        _ => None,
    }
}

fn parse_clock_part(part: &str) -> Option<f64> {
    let part = part.trim();
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Whole, non-negative count (orders, runs).
pub fn parse_count(raw: &CellValue) -> Option<u32> {
    let value = parse_locale_number(raw)?;
    if value < 0.0 {
        return None;
    }
    Some(value.round().min(u32::MAX as f64) as u32)
}

/// Trimmed display text, empty when the cell is blank.
pub fn parse_text(raw: &CellValue) -> String {
    raw.to_display_string().trim().to_string()
}
