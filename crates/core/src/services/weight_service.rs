use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::analytics::EffectiveWeight;
use crate::models::portfolio::PortfolioConfig;
use crate::models::price::PriceTable;

/// Weights rescaled over the tickers that actually have data.
///
/// Invariant: `sum()` is 1 within floating-point tolerance and every weight
/// is finite. Entries keep the configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeights {
    entries: Vec<EffectiveWeight>,
    excluded: Vec<String>,
}

impl NormalizedWeights {
    /// Normalized weight of `symbol`, matched case-insensitively.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.trim();
        self.entries
            .iter()
            .find(|w| w.symbol.eq_ignore_ascii_case(symbol))
            .map(|w| w.normalized)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|w| (w.symbol.as_str(), w.normalized))
    }

    pub fn entries(&self) -> &[EffectiveWeight] {
        &self.entries
    }

    /// Configured tickers that had no data and were dropped.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|w| w.normalized).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Filters and rescales the configured weights against a fetched table.
pub struct WeightService;

impl WeightService {
    pub fn new() -> Self {
        Self
    }

    /// Keep only allocations present in `table` and rescale them to sum to 1.
    ///
    /// Fails with `NoValidTickers` when nothing is left to rescale (no ticker
    /// has data, or all the remaining weights are zero) instead of dividing
    /// by zero.
    pub fn normalize(
        &self,
        config: &PortfolioConfig,
        table: &PriceTable,
    ) -> Result<NormalizedWeights, CoreError> {
        let (present, missing): (Vec<_>, Vec<_>) = config
            .allocations
            .iter()
            .partition(|a| table.contains(&a.symbol));

        let total: f64 = present.iter().map(|a| a.weight).sum();
        if present.is_empty() || !total.is_finite() || total <= 0.0 {
            return Err(CoreError::NoValidTickers);
        }

        let entries = present
            .into_iter()
            .map(|a| EffectiveWeight {
                symbol: a.symbol.trim().to_uppercase(),
                configured: a.weight,
                normalized: a.weight / total,
            })
            .collect();
        let excluded = missing
            .into_iter()
            .map(|a| a.symbol.trim().to_uppercase())
            .collect();

        Ok(NormalizedWeights { entries, excluded })
    }
}

impl Default for WeightService {
    fn default() -> Self {
        Self::new()
    }
}
