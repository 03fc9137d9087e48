//! Monthly service report: one order per row, split over channel tabs.
//!
//! Revenue and order counts accumulate over all channels. Timing metrics
//! (wait, make and drive time, orders per run) come from the delivery tab only.

use super::dated_rows;
use crate::document::{decode_document, RawSheet};
use crate::error::Result;
use crate::header_map::HeaderMap;
use crate::locator::{locate, DEFAULT_HEADER_KEYWORDS};
use crate::schema::MonthlyAggregate;
use crate::utils::{first_day_of_month, round2};
use crate::values::{parse_locale_number, parse_minutes_duration};
use chrono::NaiveDate;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceChannel {
    Delivery,
    Pickup,
    TakeAway,
}

impl ServiceChannel {
    /// Channel named by a sheet title, e.g. "Delivery", "Bezorging", "Afhalen".
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        let lowered = name.to_lowercase();
        if lowered.contains("delivery") || lowered.contains("bezorg") {
            Some(Self::Delivery)
        } else if ["pickup", "pick-up", "afhaal", "afhalen"]
            .iter()
            .any(|k| lowered.contains(k))
        {
            Some(Self::Pickup)
        } else if lowered.contains("take") || lowered.contains("meeneem") {
            Some(Self::TakeAway)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceField {
    OrderDate,
    OrderAmount,
    NetAmount,
    WaitTime,
    MakeTime,
    DriveTime,
    OrdersPerRun,
}

const SERVICE_ALIASES: &[(ServiceField, &[&str])] = &[
    (
        ServiceField::OrderDate,
        &["Datum", "Besteldatum", "Orderdatum", "Order Date", "Date"],
    ),
    (
        ServiceField::OrderAmount,
        &["Bedrag", "Orderbedrag", "Totaalbedrag", "Bruto Bedrag", "Order Amount", "Amount"],
    ),
    (
        ServiceField::NetAmount,
        &["Netto Bedrag", "Netto", "Net Amount"],
    ),
    (
        ServiceField::WaitTime,
        &["Wachttijd", "Levertijd", "Wait Time", "Delivery Time"],
    ),
    (ServiceField::MakeTime, &["Maaktijd", "Make Time"]),
    (ServiceField::DriveTime, &["Rijtijd", "Drive Time"]),
    (
        ServiceField::OrdersPerRun,
        &["Orders per Rit", "Ritgrootte", "Orders per Run"],
    ),
];

pub const SERVICE_HEADERS: HeaderMap<ServiceField> = HeaderMap::new(SERVICE_ALIASES);

const SERVICE_HEADER_KEYWORDS: &[&str] = &["bedrag", "amount", "order", "wachttijd"];

const WITHIN_30_MINUTES: f64 = 30.0;
const WITHIN_20_MINUTES: f64 = 20.0;

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round2(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Default)]
struct ServiceAccumulator {
    earliest: Option<NaiveDate>,
    gross_revenue: f64,
    net_revenue: f64,
    delivery_orders: u32,
    pickup_orders: u32,
    takeaway_orders: u32,
    wait: Mean,
    within_30: usize,
    within_20: usize,
    make: Mean,
    drive: Mean,
    orders_per_run: Mean,
}

impl ServiceAccumulator {
    fn order_count(&self) -> u32 {
        self.delivery_orders + self.pickup_orders + self.takeaway_orders
    }

    fn finish(self) -> Option<MonthlyAggregate> {
        if self.order_count() == 0 {
            return None;
        }

        let observed = self.wait.count;
        let rate = |hits: usize| {
            if observed == 0 {
                0.0
            } else {
                round2(hits as f64 / observed as f64 * 100.0)
            }
        };

        Some(MonthlyAggregate {
            month: self.earliest.map(first_day_of_month),
            gross_revenue: round2(self.gross_revenue),
            net_revenue: round2(self.net_revenue),
            order_count: self.order_count(),
            delivery_orders: self.delivery_orders,
            pickup_orders: self.pickup_orders,
            takeaway_orders: self.takeaway_orders,
            on_time_delivery_mins: self.wait.value(),
            make_time_mins: self.make.value(),
            drive_time_mins: self.drive.value(),
            delivery_rate_30min: rate(self.within_30),
            delivery_rate_20min: (observed > 0).then(|| rate(self.within_20)),
            avg_orders_per_run: self.orders_per_run.value(),
        })
    }
}

/// Aggregates a monthly service report. `None` when no sheet contributed a
/// positive-amount order.
pub fn extract_monthly_service(bytes: &[u8]) -> Result<Option<MonthlyAggregate>> {
    let sheets = decode_document(bytes)?;
    Ok(extract_monthly_service_sheets(&sheets))
}

pub fn extract_monthly_service_sheets(sheets: &[RawSheet]) -> Option<MonthlyAggregate> {
    let keywords: Vec<&str> = DEFAULT_HEADER_KEYWORDS
        .iter()
        .chain(SERVICE_HEADER_KEYWORDS)
        .copied()
        .collect();

    let mut acc = ServiceAccumulator::default();

    for sheet in sheets {
        let channel = match ServiceChannel::from_sheet_name(&sheet.name) {
            Some(channel) => channel,
            // A lone unlabeled sheet (e.g. a CSV export) is the delivery list.
            None if sheets.len() == 1 => ServiceChannel::Delivery,
            None => {
                warn!("Skipping sheet '{}': no service channel in its name", sheet.name);
                continue;
            }
        };
        accumulate_sheet(&mut acc, sheet, channel, &keywords);
    }

    let aggregate = acc.finish();
    match &aggregate {
        Some(a) => info!(
            "Monthly service report: {} orders, gross revenue {:.2}",
            a.order_count, a.gross_revenue
        ),
        None => info!("Monthly service report contained no usable orders"),
    }
    aggregate
}

fn accumulate_sheet(
    acc: &mut ServiceAccumulator,
    sheet: &RawSheet,
    channel: ServiceChannel,
    keywords: &[&str],
) {
    use ServiceField as F;

    let table = locate(sheet, keywords);
    let (rows, _) = dated_rows(&table, |row| SERVICE_HEADERS.resolve(row, F::OrderDate));

    let mut non_revenue = 0usize;
    for dated in rows {
        let cell = |field| SERVICE_HEADERS.resolve(dated.row, field);

        let amount = match cell(F::OrderAmount).and_then(parse_locale_number) {
            Some(a) if a > 0.0 => a,
            _ => {
                non_revenue += 1;
                continue;
            }
        };

        acc.earliest = Some(acc.earliest.map_or(dated.date, |e| e.min(dated.date)));
        acc.gross_revenue += amount;
        acc.net_revenue += cell(F::NetAmount)
            .and_then(parse_locale_number)
            .filter(|n| *n >= 0.0)
            .unwrap_or(amount);

        match channel {
            ServiceChannel::Pickup => acc.pickup_orders += 1,
            ServiceChannel::TakeAway => acc.takeaway_orders += 1,
            ServiceChannel::Delivery => {
                acc.delivery_orders += 1;

                if let Some(wait) = cell(F::WaitTime)
                    .and_then(parse_minutes_duration)
                    .filter(|w| *w >= 0.0)
                {
                    acc.wait.push(wait);
                    if wait <= WITHIN_30_MINUTES {
                        acc.within_30 += 1;
                    }
                    if wait <= WITHIN_20_MINUTES {
                        acc.within_20 += 1;
                    }
                }
                let positive = |v: &f64| *v > 0.0;
                if let Some(make) = cell(F::MakeTime)
                    .and_then(parse_minutes_duration)
                    .filter(positive)
                {
                    acc.make.push(make);
                }
                if let Some(drive) = cell(F::DriveTime)
                    .and_then(parse_minutes_duration)
                    .filter(positive)
                {
                    acc.drive.push(drive);
                }
                if let Some(per_run) = cell(F::OrdersPerRun)
                    .and_then(parse_locale_number)
                    .filter(positive)
                {
                    acc.orders_per_run.push(per_run);
                }
            }
        }
    }

    debug!(
        "Sheet '{}' ({:?}): {} rows skipped without a positive order amount",
        sheet.name, channel, non_revenue
    );
}
