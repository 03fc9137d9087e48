use crate::utils::{dutch_day_name, iso_week_number};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Report families understood by the extractors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    #[schemars(
        description = "Daily operational/KPI export, one row per day, possibly several tabs"
    )]
    Operational,

    #[schemars(
        description = "Monthly service report with delivery, pickup and take-away order sheets"
    )]
    MonthlyService,

    #[schemars(description = "Timekeeping punches, grouped into hours and headcount per day")]
    TimekeepingDaily,

    #[schemars(description = "Timekeeping cost summary yielding an average hourly rate")]
    TimekeepingRate,

    #[schemars(description = "Food cost variance report (actual vs ideal cost)")]
    CostVariance,
}

/// Where a batch of daily entries came from. Imported data is authoritative;
/// allocated data was distributed from a monthly aggregate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum DataOrigin {
    /// Observed per day in a source report.
    Imported,
    /// Proportionally allocated from a month total.
    Allocated,
}

/// One restaurant-day observation. Percentages are on the 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    #[schemars(description = "Calendar date (YYYY-MM-DD), unique per restaurant")]
    pub date: NaiveDate,
    pub day_name: String,
    pub iso_week_number: u32,

    pub planned_revenue: f64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
    pub burger_kitchen_revenue: Option<f64>,

    pub planned_labour_cost: f64,
    pub labour_cost: f64,
    pub planned_labour_pct: Option<f64>,
    pub labour_pct: f64,
    pub worked_hours: f64,
    #[schemars(description = "Net revenue per worked hour")]
    pub labour_productivity: f64,

    pub food_cost: f64,
    pub food_cost_pct: f64,

    #[serde(rename = "deliveryRate30min")]
    #[schemars(description = "Share of deliveries within 30 minutes, 0-100")]
    pub delivery_rate_30min: f64,
    #[serde(rename = "deliveryRate20min")]
    pub delivery_rate_20min: Option<f64>,
    pub on_time_delivery_mins: f64,
    pub make_time_mins: f64,
    pub drive_time_mins: f64,

    pub order_count: u32,
    pub avg_order_value: f64,
    pub orders_per_run: f64,

    #[schemars(description = "Signed cash register difference; absent when not reported")]
    pub cash_difference: Option<f64>,
    pub manager: String,
}

impl DailyEntry {
    /// All-zero entry for `date` with the Dutch day name and ISO week filled in.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            day_name: dutch_day_name(date).to_string(),
            iso_week_number: iso_week_number(date),
            planned_revenue: 0.0,
            gross_revenue: 0.0,
            net_revenue: 0.0,
            burger_kitchen_revenue: None,
            planned_labour_cost: 0.0,
            labour_cost: 0.0,
            planned_labour_pct: None,
            labour_pct: 0.0,
            worked_hours: 0.0,
            labour_productivity: 0.0,
            food_cost: 0.0,
            food_cost_pct: 0.0,
            delivery_rate_30min: 0.0,
            delivery_rate_20min: None,
            on_time_delivery_mins: 0.0,
            make_time_mins: 0.0,
            drive_time_mins: 0.0,
            order_count: 0,
            avg_order_value: 0.0,
            orders_per_run: 0.0,
            cash_difference: None,
            manager: String::new(),
        }
    }

    /// Fills every zero, `None` or empty field from `other`. Fields that are
    /// already set are kept.
    pub fn fill_missing_from(&mut self, other: &DailyEntry) {
        fn fill(target: &mut f64, source: f64) {
            if *target == 0.0 && source != 0.0 {
                *target = source;
            }
        }
        fn fill_opt(target: &mut Option<f64>, source: Option<f64>) {
            if target.map_or(true, |v| v == 0.0) {
                if let Some(v) = source.filter(|v| *v != 0.0) {
                    *target = Some(v);
                }
            }
        }

        if self.day_name.is_empty() {
            self.day_name = other.day_name.clone();
        }
        fill(&mut self.planned_revenue, other.planned_revenue);
        fill(&mut self.gross_revenue, other.gross_revenue);
        fill(&mut self.net_revenue, other.net_revenue);
        fill_opt(&mut self.burger_kitchen_revenue, other.burger_kitchen_revenue);
        fill(&mut self.planned_labour_cost, other.planned_labour_cost);
        fill(&mut self.labour_cost, other.labour_cost);
        fill_opt(&mut self.planned_labour_pct, other.planned_labour_pct);
        fill(&mut self.labour_pct, other.labour_pct);
        fill(&mut self.worked_hours, other.worked_hours);
        fill(&mut self.labour_productivity, other.labour_productivity);
        fill(&mut self.food_cost, other.food_cost);
        fill(&mut self.food_cost_pct, other.food_cost_pct);
        fill(&mut self.delivery_rate_30min, other.delivery_rate_30min);
        fill_opt(&mut self.delivery_rate_20min, other.delivery_rate_20min);
        fill(&mut self.on_time_delivery_mins, other.on_time_delivery_mins);
        fill(&mut self.make_time_mins, other.make_time_mins);
        fill(&mut self.drive_time_mins, other.drive_time_mins);
        if self.order_count == 0 {
            self.order_count = other.order_count;
        }
        fill(&mut self.avg_order_value, other.avg_order_value);
        fill(&mut self.orders_per_run, other.orders_per_run);
        fill_opt(&mut self.cash_difference, other.cash_difference);
        if self.manager.is_empty() {
            self.manager = other.manager.clone();
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DailyEntry)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Month-granularity totals from the monthly service report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    #[schemars(
        description = "First day of the month of the earliest order, when any order was dated"
    )]
    pub month: Option<NaiveDate>,

    pub gross_revenue: f64,
    pub net_revenue: f64,

    pub order_count: u32,
    pub delivery_orders: u32,
    pub pickup_orders: u32,
    pub takeaway_orders: u32,

    #[schemars(description = "Average wait time of delivery orders in minutes")]
    pub on_time_delivery_mins: f64,
    pub make_time_mins: f64,
    pub drive_time_mins: f64,
    #[serde(rename = "deliveryRate30min")]
    pub delivery_rate_30min: f64,
    #[serde(rename = "deliveryRate20min")]
    pub delivery_rate_20min: Option<f64>,
    pub avg_orders_per_run: f64,
}

/// Hours and distinct employees for one day of timekeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyLabourMetric {
    pub date: NaiveDate,
    pub hours: f64,
    pub employee_count: u32,
}

/// Totals from the timekeeping-rate summary report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabourRateSummary {
    pub total_cost: f64,
    pub total_hours: f64,
    pub avg_hourly_rate: f64,
}

/// Actual versus ideal cost from the cost-variance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostVarianceSummary {
    pub actual_cost: f64,
    pub ideal_cost: f64,
    #[schemars(description = "actual - ideal, signed")]
    pub variance: f64,
    #[schemars(description = "(actual - ideal) / ideal * 100, signed; 0 when ideal is zero")]
    pub variance_pct: f64,
    #[schemars(description = "True when the report's own total row was used")]
    pub from_total_row: bool,
}
