use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::PriceTable;
use crate::models::series::{ReturnSeries, ValueSeries};
use crate::services::weight_service::NormalizedWeights;

/// Turns closing prices into daily returns and compounded value series.
///
/// Portfolio and benchmark are computed from separate inputs: the benchmark
/// path never sees the portfolio weights.
pub struct ReturnsService;

impl ReturnsService {
    pub fn new() -> Self {
        Self
    }

    /// Simple day-over-day change of a forward-filled close series.
    ///
    /// The first element, and any day whose previous or current close is
    /// missing, zero, or produces a non-finite ratio, is 0.
    pub fn daily_returns(&self, closes: &[Option<f64>]) -> Vec<f64> {
        let mut returns = Vec::with_capacity(closes.len());
        for (t, close) in closes.iter().enumerate() {
            let r = match (t.checked_sub(1).and_then(|p| closes[p]), close) {
                (Some(prev), Some(curr)) if prev != 0.0 => {
                    let r = curr / prev - 1.0;
                    if r.is_finite() {
                        r
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            returns.push(r);
        }
        returns
    }

    /// Per-day sum of `weight * return` across tickers.
    ///
    /// Every return slice must have length `len`.
    pub fn weighted_returns(&self, components: &[(f64, Vec<f64>)], len: usize) -> Vec<f64> {
        let mut combined = vec![0.0; len];
        for (weight, returns) in components {
            for (acc, r) in combined.iter_mut().zip(returns) {
                *acc += weight * r;
            }
        }
        combined
    }

    /// Cumulative product of `(1 + r)`, scaled by `capital`.
    pub fn compound(&self, returns: &ReturnSeries, capital: f64) -> ValueSeries {
        let mut growth = Vec::with_capacity(returns.len());
        let mut acc = 1.0;
        for r in &returns.returns {
            acc *= 1.0 + r;
            growth.push(acc);
        }
        let values = growth.iter().map(|g| g * capital).collect();

        ValueSeries {
            dates: returns.dates.clone(),
            growth,
            values,
            initial_capital: capital,
        }
    }

    /// Weighted daily returns of the portfolio on `calendar`.
    pub fn portfolio_returns(
        &self,
        table: &PriceTable,
        weights: &NormalizedWeights,
        calendar: &[NaiveDate],
    ) -> ReturnSeries {
        let components: Vec<(f64, Vec<f64>)> = weights
            .iter()
            .map(|(symbol, weight)| {
                let closes = table.aligned_closes(symbol, calendar);
                (weight, self.daily_returns(&closes))
            })
            .collect();

        ReturnSeries {
            dates: calendar.to_vec(),
            returns: self.weighted_returns(&components, calendar.len()),
        }
    }

    /// Daily returns of the benchmark on `calendar`.
    pub fn benchmark_returns(
        &self,
        table: &PriceTable,
        benchmark_symbol: &str,
        calendar: &[NaiveDate],
    ) -> Result<ReturnSeries, CoreError> {
        if !table.contains(benchmark_symbol) {
            return Err(CoreError::BenchmarkUnavailable(benchmark_symbol.to_string()));
        }
        let closes = table.aligned_closes(benchmark_symbol, calendar);
        Ok(ReturnSeries {
            dates: calendar.to_vec(),
            returns: self.daily_returns(&closes),
        })
    }

    pub fn portfolio_series(
        &self,
        table: &PriceTable,
        weights: &NormalizedWeights,
        calendar: &[NaiveDate],
        capital: f64,
    ) -> ValueSeries {
        let returns = self.portfolio_returns(table, weights, calendar);
        self.compound(&returns, capital)
    }

    pub fn benchmark_series(
        &self,
        table: &PriceTable,
        benchmark_symbol: &str,
        calendar: &[NaiveDate],
        capital: f64,
    ) -> Result<ValueSeries, CoreError> {
        let returns = self.benchmark_returns(table, benchmark_symbol, calendar)?;
        Ok(self.compound(&returns, capital))
    }
}

impl Default for ReturnsService {
    fn default() -> Self {
        Self::new()
    }
}
