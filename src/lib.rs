//! # KPI History Builder
//!
//! A library for turning restaurant point-of-sale report exports (spreadsheet
//! workbooks or delimited text) into a clean, date-keyed daily KPI history.
//!
//! ## Core Concepts
//!
//! - **Extraction**: each report family (daily operational, monthly service,
//!   timekeeping, timekeeping rate, cost variance) has an extractor that finds
//!   the header row, drops total/average lines and maps localized column
//!   headers onto canonical fields
//! - **Distribution**: month-only service totals are spread over the days of
//!   the month using worked hours from timekeeping as weights
//! - **Merge**: entries from several sources are reconciled per date, with
//!   imported daily data taking precedence over allocated data
//!
//! ## Example
//!
//! ```rust,ignore
//! use kpi_history_builder::*;
//!
//! let config = ReconciliationConfig::default();
//! let allocated = KpiHistoryProcessor::reconcile_month(
//!     &std::fs::read("service-2026-03.xlsx")?,
//!     &std::fs::read("uren-2026-03.xlsx")?,
//!     Some(&std::fs::read("loonkosten-2026-03.csv")?),
//!     &config,
//! )?;
//!
//! let operational = extract_operational(&std::fs::read("kpi-2026-03.csv")?)?;
//! let history = merge_entries(
//!     &config,
//!     vec![
//!         (DataOrigin::Imported, operational),
//!         (DataOrigin::Allocated, allocated),
//!     ],
//! );
//! ```

pub mod classifier;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod header_map;
pub mod locator;
pub mod merge;
pub mod schema;
pub mod utils;
pub mod values;

pub use classifier::{
    is_summary_label, is_summary_row, is_total_label, SUMMARY_KEYWORDS, TOTAL_KEYWORDS,
};
pub use config::{ReconciliationConfig, DEFAULT_FALLBACK_HOURLY_RATE};
pub use document::{decode_document, sniff_format, CellValue, DocumentFormat, RawSheet};
pub use engine::Distributor;
pub use error::{IngestError, Result};
pub use extractors::cost_variance::extract_cost_variance;
pub use extractors::operational::extract_operational;
pub use extractors::service::{extract_monthly_service, ServiceChannel};
pub use extractors::timekeeping::{extract_timekeeping_daily, extract_timekeeping_rate};
pub use header_map::HeaderMap;
pub use locator::{find_header_row, locate, NamedRow, SheetTable};
pub use merge::{merge_entries, CanonicalMerger};
pub use schema::*;
pub use values::{
    parse_count, parse_flexible_date, parse_hours_duration, parse_locale_number,
    parse_minutes_duration, parse_percentage, parse_text, to_iso_date,
};

use log::{debug, info};
use serde::Serialize;

/// Output of [`extract_report`], one variant per report family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Extraction {
    Operational(Vec<DailyEntry>),
    MonthlyService(Option<MonthlyAggregate>),
    TimekeepingDaily(Vec<DailyLabourMetric>),
    TimekeepingRate(Option<LabourRateSummary>),
    CostVariance(Option<CostVarianceSummary>),
}

impl Extraction {
    pub fn kind(&self) -> ReportKind {
        match self {
            Extraction::Operational(_) => ReportKind::Operational,
            Extraction::MonthlyService(_) => ReportKind::MonthlyService,
            Extraction::TimekeepingDaily(_) => ReportKind::TimekeepingDaily,
            Extraction::TimekeepingRate(_) => ReportKind::TimekeepingRate,
            Extraction::CostVariance(_) => ReportKind::CostVariance,
        }
    }

    /// True for the "recognized but no usable data" outcome.
    pub fn is_empty(&self) -> bool {
        match self {
            Extraction::Operational(entries) => entries.is_empty(),
            Extraction::MonthlyService(aggregate) => aggregate.is_none(),
            Extraction::TimekeepingDaily(days) => days.is_empty(),
            Extraction::TimekeepingRate(rate) => rate.is_none(),
            Extraction::CostVariance(summary) => summary.is_none(),
        }
    }
}

/// Runs the extractor for `kind` over a raw document buffer.
pub fn extract_report(kind: ReportKind, bytes: &[u8]) -> Result<Extraction> {
    debug!("Extracting {:?} report from {} bytes", kind, bytes.len());
    let extraction = match kind {
        ReportKind::Operational => Extraction::Operational(extract_operational(bytes)?),
        ReportKind::MonthlyService => Extraction::MonthlyService(extract_monthly_service(bytes)?),
        ReportKind::TimekeepingDaily => {
            Extraction::TimekeepingDaily(extract_timekeeping_daily(bytes)?)
        }
        ReportKind::TimekeepingRate => {
            Extraction::TimekeepingRate(extract_timekeeping_rate(bytes)?)
        }
        ReportKind::CostVariance => Extraction::CostVariance(extract_cost_variance(bytes)?),
    };
    Ok(extraction)
}

pub struct KpiHistoryProcessor;

impl KpiHistoryProcessor {
    /// Daily entries for one month from its service report and timekeeping
    /// export. The optional rate report supplies the hourly labour cost;
    /// without it the configured fallback rate is used.
    pub fn reconcile_month(
        service: &[u8],
        timekeeping: &[u8],
        rate: Option<&[u8]>,
        config: &ReconciliationConfig,
    ) -> Result<Vec<DailyEntry>> {
        config.validate()?;

        let Some(monthly) = extract_monthly_service(service)? else {
            info!("Service report has no usable orders; nothing to reconcile");
            return Ok(Vec::new());
        };
        let labour = extract_timekeeping_daily(timekeeping)?;
        let hourly_rate = match rate {
            Some(bytes) => extract_timekeeping_rate(bytes)?.map(|r| r.avg_hourly_rate),
            None => None,
        };

        let entries = Distributor::new(config).distribute(&monthly, &labour, hourly_rate);
        info!(
            "Reconciled {} daily entries for {}",
            entries.len(),
            monthly
                .month
                .map(|m| m.format("%Y-%m").to_string())
                .unwrap_or_else(|| "an undated month".to_string())
        );
        Ok(entries)
    }

    /// Merges imported daily entries with already reconciled months into one
    /// sorted, de-duplicated history.
    pub fn build_history(
        imported: Vec<DailyEntry>,
        allocated_months: Vec<Vec<DailyEntry>>,
        config: &ReconciliationConfig,
    ) -> Result<Vec<DailyEntry>> {
        config.validate()?;

        let mut merger = CanonicalMerger::new(config);
        merger.push(DataOrigin::Imported, imported);
        for month in allocated_months {
            merger.push(DataOrigin::Allocated, month);
        }
        Ok(merger.finish())
    }
}
