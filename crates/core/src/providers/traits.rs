use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::PriceBar;

/// Source of daily price history.
///
/// Each market-data API implements this trait so the fetch service can fall
/// back from one source to the next without knowing which one answered.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Daily bars for `symbol` with `start <= date < end`, sorted by date.
    ///
    /// An unknown symbol may be reported either as an error or as an empty
    /// list; callers treat both as "no data".
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, CoreError>;
}
