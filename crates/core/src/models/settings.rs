use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Smallest initial investment the dashboard accepts.
pub const MIN_INITIAL_CAPITAL: f64 = 1_000.0;

/// Default initial investment.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Granularity of the capital input control.
pub const CAPITAL_STEP: f64 = 500.0;

/// Bounds of the auto-refresh slider, in seconds.
pub const MIN_REFRESH_SECS: u32 = 10;
pub const MAX_REFRESH_SECS: u32 = 3_600;

/// Default lookback when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Maximum requested date range in days (10 years).
pub const MAX_RANGE_DAYS: i64 = 3650;

/// Parameters the user adjusts on every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardParams {
    /// First day of history (inclusive).
    pub start: NaiveDate,

    /// Last day of history (exclusive).
    pub end: NaiveDate,

    /// Amount invested at `start`, in the portfolio's quote currency.
    pub initial_capital: f64,

    /// Page auto-refresh interval; `None` disables auto-refresh.
    pub refresh_interval_secs: Option<u32>,
}

impl DashboardParams {
    /// Parameters ending today with the default lookback and capital.
    pub fn for_today() -> Self {
        Self::ending_on(Utc::now().date_naive())
    }

    pub fn ending_on(end: NaiveDate) -> Self {
        Self {
            start: end - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            refresh_interval_secs: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start >= self.end {
            return Err(CoreError::ValidationError(format!(
                "Start date ({}) must be before end date ({})",
                self.start, self.end
            )));
        }
        let range_days = (self.end - self.start).num_days();
        if range_days > MAX_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "Date range of {range_days} days exceeds maximum of {MAX_RANGE_DAYS} days (10 years)"
            )));
        }
        if !self.initial_capital.is_finite() || self.initial_capital < MIN_INITIAL_CAPITAL {
            return Err(CoreError::ValidationError(format!(
                "Initial investment must be at least {MIN_INITIAL_CAPITAL}, got {}",
                self.initial_capital
            )));
        }
        if let Some(secs) = self.refresh_interval_secs {
            if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&secs) {
                return Err(CoreError::ValidationError(format!(
                    "Refresh interval must be between {MIN_REFRESH_SECS} and {MAX_REFRESH_SECS} seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self::for_today()
    }
}
