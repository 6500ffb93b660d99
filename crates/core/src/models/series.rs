use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day-over-day fractional returns on a shared calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    /// `returns[0]` is always 0: the first day has no prior close.
    pub returns: Vec<f64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Compounded growth of an initial capital.
///
/// `growth[t]` is the product of `(1 + r_i)` for every `i <= t`, and
/// `values[t] = capital * growth[t]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSeries {
    pub dates: Vec<NaiveDate>,
    pub growth: Vec<f64>,
    pub values: Vec<f64>,
    pub initial_capital: f64,
}

impl ValueSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total compounded return as a fraction (0.1 = +10%). Zero for an empty series.
    pub fn total_return(&self) -> f64 {
        self.growth.last().map(|g| g - 1.0).unwrap_or(0.0)
    }

    /// Value on the last date, or the initial capital for an empty series.
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(self.initial_capital)
    }
}
