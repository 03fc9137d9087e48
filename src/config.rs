use crate::error::{IngestError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Hourly labour cost used when no timekeeping-rate report is available.
pub const DEFAULT_FALLBACK_HOURLY_RATE: f64 = 17.50;

/// Explicit settings for reconciliation and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationConfig {
    #[schemars(description = "Labour cost per hour when the rate summary yields no rate")]
    pub fallback_hourly_rate: f64,

    #[schemars(
        description = "Days before this date are ignored when distributing and merging (YYYY-MM-DD)"
    )]
    pub earliest_period: Option<NaiveDate>,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            fallback_hourly_rate: DEFAULT_FALLBACK_HOURLY_RATE,
            earliest_period: None,
        }
    }
}

impl ReconciliationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fallback_hourly_rate.is_finite() || self.fallback_hourly_rate <= 0.0 {
            return Err(IngestError::InvalidHourlyRate(self.fallback_hourly_rate));
        }
        Ok(())
    }

    /// Whether `date` is on or after the earliest allowed period.
    pub fn allows(&self, date: NaiveDate) -> bool {
        self.earliest_period.map_or(true, |earliest| date >= earliest)
    }

    /// The supplied rate when usable, the fallback otherwise.
    pub fn hourly_rate_or_fallback(&self, rate: Option<f64>) -> f64 {
        rate.filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.fallback_hourly_rate)
    }
}
