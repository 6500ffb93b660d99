use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::price::{HistoryCache, HistoryRequest, PriceBar, PriceTable};
use crate::providers::registry::ProviderRegistry;

/// Downloads price history from the registered providers with memoization.
///
/// Cache strategy:
/// - The key is the full request: sorted ticker-set + start + end.
/// - An identical request is answered from `HistoryCache` without touching
///   any provider, for as long as the process lives (or until evicted).
/// - Failed downloads are never cached, including a table that is only
///   missing some symbols because their download errored.
pub struct PriceService {
    registry: ProviderRegistry,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Names of the registered providers, in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Fetch the price table for `request`, consulting `cache` first.
    ///
    /// Every symbol is downloaded concurrently. Symbols that fail on every
    /// provider, or come back empty, are left out of the table. If no symbol
    /// produced data and at least one failed, the last failure is returned.
    pub async fn fetch_table(
        &self,
        cache: &mut HistoryCache,
        request: &HistoryRequest,
    ) -> Result<Arc<PriceTable>, CoreError> {
        self.fetch_table_requiring(cache, request, &[]).await
    }

    /// Like [`fetch_table`](Self::fetch_table), but a download error for any
    /// symbol in `required` fails the whole fetch with that error instead of
    /// leaving the symbol out.
    ///
    /// Only tables where every symbol either returned bars or returned an
    /// empty list go into the cache; a table missing a symbol because of an
    /// error is served once and fetched again on the next call.
    pub async fn fetch_table_requiring(
        &self,
        cache: &mut HistoryCache,
        request: &HistoryRequest,
        required: &[&str],
    ) -> Result<Arc<PriceTable>, CoreError> {
        if let Some(table) = cache.get(request) {
            debug!(
                "History cache hit for {} symbols ({} to {})",
                request.symbols().len(),
                request.start,
                request.end
            );
            return Ok(table);
        }

        if self.registry.is_empty() {
            return Err(CoreError::NoProvider);
        }

        info!(
            "Downloading {} symbols from {} to {}",
            request.symbols().len(),
            request.start,
            request.end
        );

        let downloads = request
            .symbols()
            .iter()
            .map(|symbol| self.fetch_symbol(symbol, request.start, request.end));
        let results = join_all(downloads).await;

        let mut table = PriceTable::new();
        let mut failed = 0usize;
        let mut last_error = None;
        for (symbol, result) in request.symbols().iter().zip(results) {
            match result {
                Ok(bars) if bars.is_empty() => {
                    warn!("No price data for {symbol}; leaving it out");
                }
                Ok(bars) => table.insert(symbol, bars),
                Err(e) if required.iter().any(|r| r.eq_ignore_ascii_case(symbol)) => {
                    warn!("Required symbol {symbol} failed: {e}");
                    return Err(e);
                }
                Err(e) => {
                    warn!("Dropping {symbol}: {e}");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if table.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        info!(
            "Downloaded {}/{} symbols",
            table.len(),
            request.symbols().len()
        );

        let table = Arc::new(table);
        if failed == 0 {
            cache.insert(request.clone(), Arc::clone(&table));
        } else {
            warn!("{failed} symbols failed to download; not caching this table");
        }
        Ok(table)
    }

    /// Fetch one symbol with automatic fallback.
    ///
    /// Tries providers in registration order. A provider that errors or
    /// returns no usable bars hands over to the next one.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, CoreError> {
        let mut last_error = None;

        for provider in self.registry.providers() {
            match provider.fetch_history(symbol, start, end).await {
                Ok(bars) => {
                    let total = bars.len();
                    let valid: Vec<PriceBar> = bars
                        .into_iter()
                        .filter(|b| b.close.is_finite() && b.close >= 0.0)
                        .collect();
                    if valid.len() < total {
                        warn!(
                            "{}: discarded {} invalid bars for {symbol}",
                            provider.name(),
                            total - valid.len()
                        );
                    }
                    if !valid.is_empty() {
                        return Ok(valid);
                    }
                    debug!("{} returned no bars for {symbol}", provider.name());
                }
                Err(e) => {
                    warn!("{} failed for {symbol}: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}
