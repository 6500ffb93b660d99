use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::CoreError;

/// One configured position: a ticker and its target share of capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Ticker symbol, uppercased (e.g., "RHM.DE", "BTC-USD")
    pub symbol: String,

    /// Target fraction of total capital. Renormalized at render time.
    pub weight: f64,
}

impl Allocation {
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            weight,
        }
    }
}

/// The reference index the portfolio is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub symbol: String,

    /// Display label used in the chart legend and metric captions.
    pub label: String,
}

impl Benchmark {
    pub fn new(symbol: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            label: label.into(),
        }
    }
}

/// Immutable portfolio definition passed into every computation.
///
/// Built once at startup (from the built-in default or a config file) and
/// never mutated afterwards. Weights do not have to sum to exactly 1: they
/// are rescaled over whichever tickers actually return data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Shown as the page title.
    pub name: String,

    /// Configured positions, in display order.
    pub allocations: Vec<Allocation>,

    pub benchmark: Benchmark,
}

impl PortfolioConfig {
    pub fn new(
        name: impl Into<String>,
        allocations: Vec<Allocation>,
        benchmark: Benchmark,
    ) -> Result<Self, CoreError> {
        let config = Self {
            name: name.into(),
            allocations,
            benchmark,
        };
        config.validate()?;
        Ok(config)
    }

    /// The built-in "Global Disruption" portfolio benchmarked against the S&P 500.
    pub fn global_disruption() -> Self {
        let allocations = [
            ("RHM.DE", 0.07),
            ("012450.KQ", 0.05),
            ("HAG.DE", 0.04),
            ("RTX", 0.05),
            ("PLTR", 0.05),
            ("XOM", 0.05),
            ("VALE", 0.05),
            ("MP", 0.05),
            ("CCJ", 0.05),
            ("NEM", 0.05),
            ("TSM", 0.05),
            ("TXN", 0.05),
            ("INFY", 0.05),
            ("CSU.TO", 0.05),
            ("EWZ", 0.05),
            ("EMLP", 0.05),
            ("BTC-USD", 0.05),
            ("TLT", 0.05),
        ]
        .into_iter()
        .map(|(symbol, weight)| Allocation::new(symbol, weight))
        .collect();

        Self {
            name: "Live Global Disruption Portfolio Dashboard".to_string(),
            allocations,
            benchmark: Benchmark::new("^GSPC", "S&P 500"),
        }
    }

    /// Check the definition is usable before any data is fetched.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.allocations.is_empty() {
            return Err(CoreError::ValidationError(
                "Portfolio must contain at least one allocation".into(),
            ));
        }
        if self.benchmark.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Benchmark symbol must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for allocation in &self.allocations {
            if allocation.symbol.trim().is_empty() {
                return Err(CoreError::ValidationError(
                    "Allocation symbol must not be empty".into(),
                ));
            }
            if !allocation.weight.is_finite() || allocation.weight < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Weight for {} must be finite and non-negative, got {}",
                    allocation.symbol, allocation.weight
                )));
            }
            if !seen.insert(allocation.symbol.trim().to_uppercase()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate allocation for {}",
                    allocation.symbol
                )));
            }
        }

        if seen.contains(&self.benchmark.symbol.trim().to_uppercase()) {
            return Err(CoreError::ValidationError(format!(
                "Benchmark {} must not also be a portfolio allocation",
                self.benchmark.symbol
            )));
        }

        if self.total_weight() <= 0.0 {
            return Err(CoreError::ValidationError(
                "Portfolio weights must not all be zero".into(),
            ));
        }

        Ok(())
    }

    /// Sum of the configured (not yet renormalized) weights.
    pub fn total_weight(&self) -> f64 {
        self.allocations.iter().map(|a| a.weight).sum()
    }

    /// Every symbol that has to be downloaded: allocations first, then the benchmark.
    pub fn symbols(&self) -> Vec<String> {
        self.allocations
            .iter()
            .map(|a| a.symbol.clone())
            .chain(std::iter::once(self.benchmark.symbol.clone()))
            .collect()
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self::global_disruption()
    }
}
