use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Day zero of the spreadsheet serial calendar (1900 system, including the
/// phantom 1900-02-29 that makes the epoch land on Dec 30).
pub const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial a workbook can hold (9999-12-31).
pub const MAX_SERIAL: f64 = 2_958_465.0;

pub fn serial_epoch() -> NaiveDate {
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Converts a spreadsheet serial day count into a calendar date.
/// The fractional (time-of-day) part is dropped.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    serial_epoch().checked_add_days(Days::new(serial.floor() as u64))
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Dutch weekday name as printed by the reporting portal ("Maandag", ...).
pub fn dutch_day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Maandag",
        Weekday::Tue => "Dinsdag",
        Weekday::Wed => "Woensdag",
        Weekday::Thu => "Donderdag",
        Weekday::Fri => "Vrijdag",
        Weekday::Sat => "Zaterdag",
        Weekday::Sun => "Zondag",
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator * 100`, or 0 when the denominator is not positive.
pub fn percentage_of(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        round2(numerator / denominator * 100.0)
    } else {
        0.0
    }
}

/// Clamps negative and non-finite values to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
