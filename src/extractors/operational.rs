//! Daily operational/KPI export: one row per day, one or more tabs.

use super::dated_rows;
use crate::document::{decode_document, RawSheet};
use crate::error::Result;
use crate::header_map::HeaderMap;
use crate::locator::{locate, NamedRow, DEFAULT_HEADER_KEYWORDS};
use crate::schema::DailyEntry;
use crate::utils::{non_negative, percentage_of, round2};
use crate::values::{
    parse_count, parse_hours_duration, parse_locale_number, parse_minutes_duration,
    parse_percentage, parse_text,
};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalField {
    Date,
    DayName,
    PlannedRevenue,
    GrossRevenue,
    NetRevenue,
    BurgerKitchenRevenue,
    PlannedLabourCost,
    LabourCost,
    PlannedLabourPct,
    LabourPct,
    WorkedHours,
    LabourProductivity,
    FoodCost,
    FoodCostPct,
    DeliveryRate30,
    DeliveryRate20,
    OnTimeDeliveryMins,
    MakeTimeMins,
    DriveTimeMins,
    OrderCount,
    AvgOrderValue,
    OrdersPerRun,
    CashDifference,
    Manager,
}

const OPERATIONAL_ALIASES: &[(OperationalField, &[&str])] = &[
    (OperationalField::Date, &["Datum", "Date", "Dag Datum"]),
    (OperationalField::DayName, &["Dag", "Day", "Weekdag"]),
    (
        OperationalField::PlannedRevenue,
        &["Geplande Omzet", "Omzet Gepland", "Budget Omzet", "Planned Revenue"],
    ),
    (
        OperationalField::GrossRevenue,
        &["Bruto Omzet", "Omzet Bruto", "Omzet incl. BTW", "Gross Revenue"],
    ),
    (
        OperationalField::NetRevenue,
        &["Netto Omzet", "Omzet Netto", "Omzet excl. BTW", "Net Revenue", "Omzet"],
    ),
    (
        OperationalField::BurgerKitchenRevenue,
        &["Burger Kitchen Omzet", "Omzet Burger Kitchen", "Burger Kitchen"],
    ),
    (
        OperationalField::PlannedLabourCost,
        &["Geplande Arbeidskosten", "Arbeidskosten Gepland", "Planned Labour Cost"],
    ),
    (
        OperationalField::LabourCost,
        &["Arbeidskosten", "Loonkosten", "Labour Cost", "Labor Cost"],
    ),
    (
        OperationalField::PlannedLabourPct,
        &["% Geplande Arbeidskosten", "Gepland % Arbeidskosten", "Planned Labour %"],
    ),
    (
        OperationalField::LabourPct,
        &["% Arbeidskosten", "Arbeidskosten %", "% Loonkosten", "Labour %", "Labor %"],
    ),
    (
        OperationalField::WorkedHours,
        &["Gewerkte Uren", "Uren", "Worked Hours", "Hours"],
    ),
    (
        OperationalField::LabourProductivity,
        &["Productiviteit", "Arbeidsproductiviteit", "Omzet per Uur", "Labour Productivity"],
    ),
    (OperationalField::FoodCost, &["Food Cost", "Foodcost", "Kostprijs"]),
    (
        OperationalField::FoodCostPct,
        &["% Food Cost", "Food Cost %", "% Foodcost", "Foodcost %"],
    ),
    (
        OperationalField::DeliveryRate30,
        &["% Binnen 30 min", "Bezorgd binnen 30 min", "Delivery < 30 min", "Delivery Rate 30"],
    ),
    (
        OperationalField::DeliveryRate20,
        &["% Binnen 20 min", "Bezorgd binnen 20 min", "Delivery < 20 min", "Delivery Rate 20"],
    ),
    (
        OperationalField::OnTimeDeliveryMins,
        &["Levertijd", "Gem. Levertijd", "Wachttijd", "On Time Delivery"],
    ),
    (OperationalField::MakeTimeMins, &["Maaktijd", "Bereidingstijd", "Make Time"]),
    (OperationalField::DriveTimeMins, &["Rijtijd", "Drive Time"]),
    (
        OperationalField::OrderCount,
        &["Orders", "Aantal Orders", "Bestellingen", "Order Count"],
    ),
    (
        OperationalField::AvgOrderValue,
        &["Gem. Orderwaarde", "Gemiddelde Orderwaarde", "Gem. Bon", "Average Order Value"],
    ),
    (
        OperationalField::OrdersPerRun,
        &["Orders per Rit", "Orders/Rit", "Orders per Run"],
    ),
    (
        OperationalField::CashDifference,
        &["Kasverschil", "Kas Verschil", "Cash Difference"],
    ),
    (
        OperationalField::Manager,
        &["Manager", "Shiftmanager", "Dienstleider", "Verantwoordelijke"],
    ),
];

pub const OPERATIONAL_HEADERS: HeaderMap<OperationalField> = HeaderMap::new(OPERATIONAL_ALIASES);

/// Extracts daily entries from an operational export. Later tabs overwrite
/// earlier ones for the same date; the result is sorted by date.
pub fn extract_operational(bytes: &[u8]) -> Result<Vec<DailyEntry>> {
    let sheets = decode_document(bytes)?;
    Ok(extract_operational_sheets(&sheets))
}

pub fn extract_operational_sheets(sheets: &[RawSheet]) -> Vec<DailyEntry> {
    let mut by_date: BTreeMap<NaiveDate, DailyEntry> = BTreeMap::new();

    for sheet in sheets {
        for entry in extract_sheet(sheet) {
            by_date.insert(entry.date, entry);
        }
    }

    info!(
        "Operational import produced {} daily entries from {} sheets",
        by_date.len(),
        sheets.len()
    );
    by_date.into_values().collect()
}

/// Entries of a single sheet in row order (duplicates not yet collapsed).
fn extract_sheet(sheet: &RawSheet) -> Vec<DailyEntry> {
    let table = locate(sheet, DEFAULT_HEADER_KEYWORDS);
    let (rows, _) = dated_rows(&table, |row| {
        OPERATIONAL_HEADERS.resolve(row, OperationalField::Date)
    });

    let recognized = OPERATIONAL_HEADERS
        .fields()
        .filter(|field| OPERATIONAL_HEADERS.matched_alias(&table.headers, *field).is_some())
        .count();
    debug!(
        "Sheet '{}': {} canonical columns recognized",
        table.name, recognized
    );

    rows.into_iter()
        .map(|dated| entry_from_row(dated.date, dated.row))
        .collect()
}

fn entry_from_row(date: NaiveDate, row: &NamedRow) -> DailyEntry {
    use OperationalField as F;

    let cell = |field| OPERATIONAL_HEADERS.resolve(row, field);
    let amount = |field| {
        cell(field)
            .and_then(parse_locale_number)
            .map(non_negative)
            .unwrap_or(0.0)
    };
    let pct = |field| {
        cell(field)
            .map(parse_percentage)
            .map(non_negative)
            .unwrap_or(0.0)
    };
    let optional_pct = |field| {
        cell(field)
            .filter(|c| parse_locale_number(c).is_some())
            .map(parse_percentage)
            .map(non_negative)
    };
    let minutes = |field| {
        cell(field)
            .and_then(parse_minutes_duration)
            .map(non_negative)
            .unwrap_or(0.0)
    };

    let mut entry = DailyEntry::new(date);

    let day_name = cell(F::DayName).map(parse_text).unwrap_or_default();
    if !day_name.is_empty() {
        entry.day_name = day_name;
    }

    entry.planned_revenue = amount(F::PlannedRevenue);
    entry.gross_revenue = amount(F::GrossRevenue);
    entry.net_revenue = amount(F::NetRevenue);
    entry.burger_kitchen_revenue = cell(F::BurgerKitchenRevenue)
        .and_then(parse_locale_number)
        .map(non_negative);

    entry.planned_labour_cost = amount(F::PlannedLabourCost);
    entry.labour_cost = amount(F::LabourCost);
    entry.planned_labour_pct = optional_pct(F::PlannedLabourPct);
    entry.labour_pct = pct(F::LabourPct);
    entry.worked_hours = cell(F::WorkedHours)
        .and_then(parse_hours_duration)
        .map(non_negative)
        .unwrap_or(0.0);
    entry.labour_productivity = amount(F::LabourProductivity);

    entry.food_cost = amount(F::FoodCost);
    entry.food_cost_pct = pct(F::FoodCostPct);

    entry.delivery_rate_30min = pct(F::DeliveryRate30);
    entry.delivery_rate_20min = optional_pct(F::DeliveryRate20);
    entry.on_time_delivery_mins = minutes(F::OnTimeDeliveryMins);
    entry.make_time_mins = minutes(F::MakeTimeMins);
    entry.drive_time_mins = minutes(F::DriveTimeMins);

    entry.order_count = cell(F::OrderCount).and_then(parse_count).unwrap_or(0);
    entry.avg_order_value = amount(F::AvgOrderValue);
    entry.orders_per_run = amount(F::OrdersPerRun);

    entry.cash_difference = cell(F::CashDifference).and_then(parse_locale_number);
    entry.manager = cell(F::Manager).map(parse_text).unwrap_or_default();

    derive_missing_ratios(&mut entry);
    entry
}

/// Ratios the export sometimes leaves out, computed from the totals.
fn derive_missing_ratios(entry: &mut DailyEntry) {
    if entry.avg_order_value == 0.0 && entry.order_count > 0 {
        entry.avg_order_value = round2(entry.net_revenue / entry.order_count as f64);
    }
    if entry.labour_productivity == 0.0 && entry.worked_hours > 0.0 {
        entry.labour_productivity = round2(entry.net_revenue / entry.worked_hours);
    }
    if entry.labour_pct == 0.0 {
        entry.labour_pct = percentage_of(entry.labour_cost, entry.net_revenue);
    }
    if entry.food_cost_pct == 0.0 {
        entry.food_cost_pct = percentage_of(entry.food_cost, entry.net_revenue);
    }
}
