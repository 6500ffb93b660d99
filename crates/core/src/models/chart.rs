use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single data point for the portfolio-vs-benchmark chart.
///
/// Generated by the core and rendered as-is by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: NaiveDate,

    /// Portfolio value in the quote currency on this date
    pub portfolio_value: f64,

    /// Value of the same capital invested in the benchmark on this date
    pub benchmark_value: f64,
}
