use crate::models::chart::ChartDataPoint;
use crate::models::series::ValueSeries;

/// Generates chart-ready data sets.
///
/// The core computes all the numbers; the frontend only renders.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Zip portfolio and benchmark values into one point per date.
    ///
    /// Both series are expected on the same calendar; extra trailing points
    /// on either side are ignored.
    pub fn build_chart(
        &self,
        portfolio: &ValueSeries,
        benchmark: &ValueSeries,
    ) -> Vec<ChartDataPoint> {
        portfolio
            .dates
            .iter()
            .zip(portfolio.values.iter().zip(&benchmark.values))
            .map(|(date, (p, b))| ChartDataPoint {
                date: *date,
                portfolio_value: *p,
                benchmark_value: *b,
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
