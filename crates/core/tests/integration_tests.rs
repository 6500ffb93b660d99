use async_trait::async_trait;
use chrono::NaiveDate;
use portfolio_dashboard_core::errors::CoreError;
use portfolio_dashboard_core::models::portfolio::{Allocation, Benchmark, PortfolioConfig};
use portfolio_dashboard_core::models::price::PriceBar;
use portfolio_dashboard_core::models::settings::DashboardParams;
use portfolio_dashboard_core::providers::registry::ProviderRegistry;
use portfolio_dashboard_core::providers::traits::HistoryProvider;
use portfolio_dashboard_core::PortfolioDashboard;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════
// Mock History Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct MockHistoryProvider {
    closes: HashMap<&'static str, Vec<(NaiveDate, f64)>>,
    calls: Arc<AtomicUsize>,
    /// Symbol whose first download fails with a network error.
    flaky: Option<&'static str>,
    flaky_failures: AtomicUsize,
}

impl MockHistoryProvider {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        let mut closes = HashMap::new();
        closes.insert("GROW", vec![(d(2025, 3, 3), 100.0), (d(2025, 3, 4), 110.0)]);
        closes.insert("FLAT", vec![(d(2025, 3, 3), 20.0), (d(2025, 3, 4), 20.0)]);
        closes.insert("^BENCH", vec![(d(2025, 3, 3), 4000.0), (d(2025, 3, 4), 4200.0)]);
        Self {
            closes,
            calls,
            flaky: None,
            flaky_failures: AtomicUsize::new(0),
        }
    }

    fn failing_once(mut self, symbol: &'static str) -> Self {
        self.flaky = Some(symbol);
        self.flaky_failures = AtomicUsize::new(1);
        self
    }
}

#[async_trait]
impl HistoryProvider for MockHistoryProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.flaky == Some(symbol)
            && self
                .flaky_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(CoreError::Network(format!("connection reset fetching {symbol}")));
        }
        Ok(self
            .closes
            .get(symbol)
            .map(|series| {
                series
                    .iter()
                    .filter(|(date, _)| *date >= start && *date < end)
                    .map(|(date, close)| PriceBar::from_close(*date, *close))
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn dashboard(allocations: &[(&str, f64)]) -> (PortfolioDashboard, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = MockHistoryProvider::new(Arc::clone(&calls));
    (dashboard_with(allocations, provider), calls)
}

fn dashboard_with(allocations: &[(&str, f64)], provider: MockHistoryProvider) -> PortfolioDashboard {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(provider));
    let config = PortfolioConfig::new(
        "Test Portfolio",
        allocations
            .iter()
            .map(|(s, w)| Allocation::new(*s, *w))
            .collect(),
        Benchmark::new("^BENCH", "Bench"),
    )
    .unwrap();
    PortfolioDashboard::with_registry(config, registry, 8).unwrap()
}

fn march_params(capital: f64) -> DashboardParams {
    DashboardParams {
        start: d(2025, 3, 1),
        end: d(2025, 3, 8),
        initial_capital: capital,
        refresh_interval_secs: None,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Integration: full render
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn render_single_full_weight_ticker() {
    let (mut dash, _) = dashboard(&[("GROW", 1.0)]);
    let snapshot = dash.render(&march_params(1000.0)).await.unwrap();

    assert_eq!(snapshot.title, "Test Portfolio");
    assert_eq!(snapshot.chart.len(), 2);
    assert!((snapshot.chart[0].portfolio_value - 1000.0).abs() < 1e-9);
    assert!((snapshot.chart[1].portfolio_value - 1100.0).abs() < 1e-9);
    assert!((snapshot.chart[1].benchmark_value - 1050.0).abs() < 1e-9);
    assert_eq!(snapshot.summary.portfolio_return_display(), "10.00");
    assert_eq!(snapshot.summary.benchmark_return_display(), "5.00");
    assert_eq!(snapshot.summary.final_value_display(), "1,100.00");
}

#[tokio::test]
async fn render_renormalizes_over_available_tickers() {
    let (mut dash, _) = dashboard(&[("GROW", 0.3), ("FLAT", 0.3), ("GONE", 0.4)]);
    let snapshot = dash.render(&march_params(10_000.0)).await.unwrap();

    assert_eq!(snapshot.excluded, vec!["GONE"]);
    let total: f64 = snapshot.weights.iter().map(|w| w.normalized).sum();
    assert!((total - 1.0).abs() < 1e-9);
    // half in +10%, half flat
    assert!((snapshot.summary.final_portfolio_value - 10_500.0).abs() < 1e-6);
}

#[tokio::test]
async fn repeated_render_uses_cache() {
    let (mut dash, calls) = dashboard(&[("GROW", 0.5), ("FLAT", 0.5)]);
    let params = march_params(5_000.0);

    dash.render(&params).await.unwrap();
    let after_first = calls.load(Ordering::SeqCst);
    assert_eq!(after_first, 3);

    // capital does not change the fetch key
    dash.render(&march_params(7_500.0)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert_eq!(dash.cache_stats().hits, 1);

    dash.invalidate_cache();
    dash.render(&params).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), after_first * 2);
}

#[tokio::test]
async fn benchmark_network_failure_is_upstream_and_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = MockHistoryProvider::new(Arc::clone(&calls)).failing_once("^BENCH");
    let mut dash = dashboard_with(&[("GROW", 1.0)], provider);
    let params = march_params(1000.0);

    let first = dash.render(&params).await.unwrap_err();
    assert!(matches!(first, CoreError::Network(_)));
    assert!(first.is_upstream_error());

    let snapshot = dash.render(&params).await.unwrap();
    assert!((snapshot.chart[1].benchmark_value - 1050.0).abs() < 1e-9);
    assert_eq!(dash.cache_stats().entries, 1);
}

#[tokio::test]
async fn ticker_network_failure_is_not_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = MockHistoryProvider::new(Arc::clone(&calls)).failing_once("FLAT");
    let mut dash = dashboard_with(&[("GROW", 0.5), ("FLAT", 0.5)], provider);
    let params = march_params(1000.0);

    let first = dash.render(&params).await.unwrap();
    assert_eq!(first.excluded, vec!["FLAT"]);
    assert_eq!(dash.cache_stats().entries, 0);

    let second = dash.render(&params).await.unwrap();
    assert!(second.excluded.is_empty());
    assert_eq!(second.weights.len(), 2);
    assert_eq!(dash.cache_stats().entries, 1);
}

#[tokio::test]
async fn render_with_no_valid_tickers_fails_cleanly() {
    let (mut dash, _) = dashboard(&[("GONE", 1.0)]);
    let result = dash.render(&march_params(1000.0)).await;
    assert!(matches!(result, Err(CoreError::NoValidTickers)));
}

#[tokio::test]
async fn render_empty_range_fails() {
    let (mut dash, _) = dashboard(&[("GROW", 1.0)]);
    let params = DashboardParams {
        start: d(2025, 4, 1),
        end: d(2025, 4, 5),
        initial_capital: 1000.0,
        refresh_interval_secs: None,
    };
    let result = dash.render(&params).await;
    assert!(matches!(result, Err(CoreError::EmptyPriceHistory { .. })));
}

#[tokio::test]
async fn render_rejects_invalid_params_before_fetching() {
    let (mut dash, calls) = dashboard(&[("GROW", 1.0)]);
    let result = dash.render(&march_params(500.0)).await;
    assert!(matches!(result, Err(CoreError::ValidationError(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refresh_interval_is_carried_into_snapshot() {
    let (mut dash, _) = dashboard(&[("GROW", 1.0)]);
    let mut params = march_params(1000.0);
    params.refresh_interval_secs = Some(60);
    let snapshot = dash.render(&params).await.unwrap();
    assert_eq!(snapshot.refresh_interval_secs(), Some(60));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let config = PortfolioConfig {
        name: "bad".into(),
        allocations: vec![],
        benchmark: Benchmark::new("^BENCH", "Bench"),
    };
    let result = PortfolioDashboard::with_registry(config, ProviderRegistry::new(), 4);
    assert!(result.is_err());
}
