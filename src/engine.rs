use crate::config::ReconciliationConfig;
use crate::schema::{DailyEntry, DailyLabourMetric, MonthlyAggregate};
use crate::utils::{percentage_of, round2, same_month};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

/// Spreads month-granularity service totals over the days of that month,
/// weighted by worked hours.
pub struct Distributor<'a> {
    config: &'a ReconciliationConfig,
}

// Internal struct to track one day's share of the month
struct DaySlot {
    date: NaiveDate,
    hours: f64,
    weight: f64,
}

impl<'a> Distributor<'a> {
    pub fn new(config: &'a ReconciliationConfig) -> Self {
        Self { config }
    }

    /// Daily entries for every labour day in the aggregate's month.
    ///
    /// Revenue and order count are allocated by `dayHours / totalHours`; the
    /// order count is rounded per day, so the daily counts may miss the month
    /// total by a small residual. Delivery timing is a month average and is
    /// copied to every day. Labour cost is `hours * rate`, with the configured
    /// fallback when `hourly_rate` is absent.
    ///
    /// Returns an empty list when the month has no worked hours.
    pub fn distribute(
        &self,
        monthly: &MonthlyAggregate,
        labour: &[DailyLabourMetric],
        hourly_rate: Option<f64>,
    ) -> Vec<DailyEntry> {
        let slots = self.day_slots(monthly, labour);
        if slots.is_empty() {
            info!("No worked hours in the month; nothing to distribute");
            return Vec::new();
        }

        let rate = self.config.hourly_rate_or_fallback(hourly_rate);
        debug!(
            "Distributing {:.2} gross revenue over {} days at {:.2} per hour",
            monthly.gross_revenue,
            slots.len(),
            rate
        );

        slots
            .iter()
            .map(|slot| Self::allocate(monthly, slot, rate))
            .collect()
    }

    fn day_slots(&self, monthly: &MonthlyAggregate, labour: &[DailyLabourMetric]) -> Vec<DaySlot> {
        let mut hours_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for day in labour {
            let in_month = monthly.month.map_or(true, |m| same_month(m, day.date));
            if !in_month || !self.config.allows(day.date) {
                continue;
            }
            if day.hours.is_finite() && day.hours > 0.0 {
                *hours_by_day.entry(day.date).or_insert(0.0) += day.hours;
            }
        }

        let total_hours: f64 = hours_by_day.values().sum();
        if total_hours <= 0.0 {
            return Vec::new();
        }

        hours_by_day
            .into_iter()
            .map(|(date, hours)| DaySlot {
                date,
                hours,
                weight: hours / total_hours,
            })
            .collect()
    }

    fn allocate(monthly: &MonthlyAggregate, slot: &DaySlot, rate: f64) -> DailyEntry {
        let mut entry = DailyEntry::new(slot.date);

        entry.gross_revenue = round2(monthly.gross_revenue * slot.weight);
        entry.net_revenue = round2(monthly.net_revenue * slot.weight);
        entry.order_count = (monthly.order_count as f64 * slot.weight).round() as u32;

        entry.delivery_rate_30min = monthly.delivery_rate_30min;
        entry.delivery_rate_20min = monthly.delivery_rate_20min;
        entry.on_time_delivery_mins = monthly.on_time_delivery_mins;
        entry.make_time_mins = monthly.make_time_mins;
        entry.drive_time_mins = monthly.drive_time_mins;
        entry.orders_per_run = monthly.avg_orders_per_run;

        entry.worked_hours = round2(slot.hours);
        entry.labour_cost = round2(slot.hours * rate);
        entry.labour_pct = percentage_of(entry.labour_cost, entry.net_revenue);
        entry.labour_productivity = round2(entry.net_revenue / slot.hours);
        if entry.order_count > 0 {
            entry.avg_order_value = round2(entry.net_revenue / entry.order_count as f64);
        }

        entry
    }
}
