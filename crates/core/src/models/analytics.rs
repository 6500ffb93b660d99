use serde::{Deserialize, Serialize};

use super::chart::ChartDataPoint;
use super::settings::DashboardParams;

/// The three headline numbers shown under the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Compounded portfolio return over the range, in percent
    pub portfolio_return_pct: f64,

    /// Compounded benchmark return over the range, in percent
    pub benchmark_return_pct: f64,

    /// Portfolio value on the last date of the range
    pub final_portfolio_value: f64,
}

impl PerformanceSummary {
    /// Percent with two decimals, e.g. `12.34` or `-3.10`.
    pub fn portfolio_return_display(&self) -> String {
        format_percent(self.portfolio_return_pct)
    }

    pub fn benchmark_return_display(&self) -> String {
        format_percent(self.benchmark_return_pct)
    }

    /// Thousands-separated money with two decimals, e.g. `12,345.67`.
    pub fn final_value_display(&self) -> String {
        format_money(self.final_portfolio_value)
    }
}

/// Renormalized weight of one ticker that returned data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWeight {
    pub symbol: String,
    /// Weight as configured
    pub configured: f64,
    /// Weight after rescaling over the tickers with data
    pub normalized: f64,
}

/// Everything one page render needs, computed from scratch per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub title: String,
    pub benchmark_symbol: String,
    pub benchmark_label: String,
    pub params: DashboardParams,
    pub weights: Vec<EffectiveWeight>,
    /// Configured tickers with no data in the requested range
    pub excluded: Vec<String>,
    pub chart: Vec<ChartDataPoint>,
    pub summary: PerformanceSummary,
}

impl DashboardSnapshot {
    pub fn refresh_interval_secs(&self) -> Option<u32> {
        self.params.refresh_interval_secs
    }
}

/// `{:.2}` formatting used for percentage metrics.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

/// Two decimals with `,` thousands separators.
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
