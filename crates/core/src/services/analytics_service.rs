use crate::models::analytics::PerformanceSummary;
use crate::models::series::ValueSeries;

/// Computes the headline statistics shown next to the chart.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Compounded portfolio and benchmark returns in percent, plus the final
    /// portfolio value.
    ///
    /// An empty series reports a 0% return and its initial capital.
    pub fn summarize(
        &self,
        portfolio: &ValueSeries,
        benchmark: &ValueSeries,
    ) -> PerformanceSummary {
        PerformanceSummary {
            portfolio_return_pct: portfolio.total_return() * 100.0,
            benchmark_return_pct: benchmark.total_return() * 100.0,
            final_portfolio_value: portfolio.final_value(),
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
