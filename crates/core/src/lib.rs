pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use models::{
    analytics::DashboardSnapshot,
    portfolio::PortfolioConfig,
    price::{CacheStats, HistoryCache, HistoryRequest, DEFAULT_CACHE_CAPACITY},
    settings::DashboardParams,
};
use providers::registry::ProviderRegistry;
use services::{
    analytics_service::AnalyticsService, chart_service::ChartService,
    price_service::PriceService, returns_service::ReturnsService,
    weight_service::WeightService,
};
use tracing::info;

use errors::CoreError;

/// Main entry point for the portfolio dashboard core library.
/// Holds the immutable portfolio definition, the fetch cache, and all
/// services needed to render a dashboard.
#[must_use]
pub struct PortfolioDashboard {
    config: PortfolioConfig,
    price_service: PriceService,
    weight_service: WeightService,
    returns_service: ReturnsService,
    chart_service: ChartService,
    analytics_service: AnalyticsService,
    /// Memoized downloads, shared by every render in this process.
    cache: HistoryCache,
}

impl std::fmt::Debug for PortfolioDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioDashboard")
            .field("portfolio", &self.config.name)
            .field("allocations", &self.config.allocations.len())
            .field("benchmark", &self.config.benchmark.symbol)
            .field("providers", &self.price_service.provider_names())
            .field("cache", &self.cache.stats())
            .finish()
    }
}

impl PortfolioDashboard {
    /// Dashboard backed by the default providers (Yahoo Finance, plus
    /// Alpha Vantage when a key is given).
    pub fn new(
        config: PortfolioConfig,
        alphavantage_key: Option<&str>,
    ) -> Result<Self, CoreError> {
        Self::with_registry(
            config,
            ProviderRegistry::new_with_defaults(alphavantage_key),
            DEFAULT_CACHE_CAPACITY,
        )
    }

    /// Dashboard backed by an explicit provider registry.
    pub fn with_registry(
        config: PortfolioConfig,
        registry: ProviderRegistry,
        cache_capacity: usize,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            price_service: PriceService::new(registry),
            weight_service: WeightService::new(),
            returns_service: ReturnsService::new(),
            chart_service: ChartService::new(),
            analytics_service: AnalyticsService::new(),
            cache: HistoryCache::with_capacity(cache_capacity),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Recompute the whole dashboard for `params`.
    ///
    /// 1. Validate the parameters.
    /// 2. Fetch the price table (memoized by ticker-set + date range).
    /// 3. Rescale weights over the tickers that returned data.
    /// 4. Compound portfolio and benchmark returns independently.
    /// 5. Build the chart points and the summary metrics.
    pub async fn render(
        &mut self,
        params: &DashboardParams,
    ) -> Result<DashboardSnapshot, CoreError> {
        params.validate()?;

        let request = HistoryRequest::new(self.config.symbols(), params.start, params.end);
        let benchmark_symbol = self.config.benchmark.symbol.as_str();
        let table = self
            .price_service
            .fetch_table_requiring(&mut self.cache, &request, &[benchmark_symbol])
            .await?;

        let calendar = table.calendar();
        if calendar.is_empty() {
            return Err(CoreError::EmptyPriceHistory {
                start: params.start.to_string(),
                end: params.end.to_string(),
            });
        }

        let weights = self.weight_service.normalize(&self.config, &table)?;

        let capital = params.initial_capital;
        let portfolio = self
            .returns_service
            .portfolio_series(&table, &weights, &calendar, capital);
        let benchmark = self.returns_service.benchmark_series(
            &table,
            &self.config.benchmark.symbol,
            &calendar,
            capital,
        )?;

        let chart = self.chart_service.build_chart(&portfolio, &benchmark);
        let summary = self.analytics_service.summarize(&portfolio, &benchmark);

        info!(
            "Rendered {} days for {} tickers: portfolio {}%, {} {}%",
            chart.len(),
            weights.len(),
            summary.portfolio_return_display(),
            self.config.benchmark.label,
            summary.benchmark_return_display()
        );

        Ok(DashboardSnapshot {
            title: self.config.name.clone(),
            benchmark_symbol: self.config.benchmark.symbol.clone(),
            benchmark_label: self.config.benchmark.label.clone(),
            params: params.clone(),
            weights: weights.entries().to_vec(),
            excluded: weights.excluded().to_vec(),
            chart,
            summary,
        })
    }

    // ── Cache ───────────────────────────────────────────────────────

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forget every memoized download; the next render fetches again.
    pub fn invalidate_cache(&mut self) {
        info!("Clearing {} cached price tables", self.cache.len());
        self.cache.clear();
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.price_service.provider_names()
    }
}
