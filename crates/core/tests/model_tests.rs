use chrono::NaiveDate;
use portfolio_dashboard_core::errors::CoreError;
use portfolio_dashboard_core::models::analytics::{format_money, format_percent, PerformanceSummary};
use portfolio_dashboard_core::models::portfolio::{Allocation, Benchmark, PortfolioConfig};
use portfolio_dashboard_core::models::price::{
    HistoryCache, HistoryRequest, PriceBar, PriceTable, DEFAULT_CACHE_CAPACITY,
};
use portfolio_dashboard_core::models::series::ValueSeries;
use portfolio_dashboard_core::models::settings::DashboardParams;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn bar(date: NaiveDate, close: f64) -> PriceBar {
    PriceBar::from_close(date, close)
}

// ═══════════════════════════════════════════════════════════════════
//  PortfolioConfig
// ═══════════════════════════════════════════════════════════════════

mod portfolio_config {
    use super::*;

    #[test]
    fn built_in_has_eighteen_allocations() {
        let config = PortfolioConfig::global_disruption();
        assert_eq!(config.allocations.len(), 18);
        assert_eq!(config.benchmark.symbol, "^GSPC");
        assert_eq!(config.benchmark.label, "S&P 500");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn built_in_weights_sum_near_one() {
        let total = PortfolioConfig::global_disruption().total_weight();
        assert!((total - 0.91).abs() < 1e-9, "total = {total}");
    }

    #[test]
    fn built_in_keeps_configured_order() {
        let config = PortfolioConfig::global_disruption();
        assert_eq!(config.allocations[0], Allocation::new("RHM.DE", 0.07));
        assert_eq!(config.allocations[2], Allocation::new("HAG.DE", 0.04));
        assert_eq!(config.allocations[17].symbol, "TLT");
    }

    #[test]
    fn symbols_end_with_benchmark() {
        let config = PortfolioConfig::global_disruption();
        let symbols = config.symbols();
        assert_eq!(symbols.len(), 19);
        assert_eq!(symbols.last().map(String::as_str), Some("^GSPC"));
    }

    #[test]
    fn allocation_symbol_is_uppercased_and_trimmed() {
        let a = Allocation::new("  btc-usd ", 0.5);
        assert_eq!(a.symbol, "BTC-USD");
    }

    #[test]
    fn rejects_empty_allocations() {
        let result = PortfolioConfig::new("p", vec![], Benchmark::new("^GSPC", "S&P 500"));
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_duplicates_case_insensitive() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("AAPL", 0.5), Allocation::new("aapl", 0.5)],
            Benchmark::new("^GSPC", "S&P 500"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_negative_weight() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("AAPL", -0.1)],
            Benchmark::new("^GSPC", "S&P 500"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_nan_weight() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("AAPL", f64::NAN)],
            Benchmark::new("^GSPC", "S&P 500"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_all_zero_weights() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("AAPL", 0.0), Allocation::new("MSFT", 0.0)],
            Benchmark::new("^GSPC", "S&P 500"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_benchmark_inside_allocations() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("SPY", 1.0)],
            Benchmark::new("spy", "SPDR"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn rejects_blank_symbol() {
        let result = PortfolioConfig::new(
            "p",
            vec![Allocation::new("   ", 1.0)],
            Benchmark::new("^GSPC", "S&P 500"),
        );
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn serde_roundtrip() {
        let config = PortfolioConfig::global_disruption();
        let json = serde_json::to_string(&config).unwrap();
        let back: PortfolioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceTable
// ═══════════════════════════════════════════════════════════════════

mod price_table {
    use super::*;

    #[test]
    fn insert_sorts_and_dedups() {
        let mut table = PriceTable::new();
        table.insert(
            "aapl",
            vec![
                bar(d(2025, 1, 3), 102.0),
                bar(d(2025, 1, 2), 100.0),
                bar(d(2025, 1, 3), 103.0),
            ],
        );
        let bars = table.bars("AAPL").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2025, 1, 2));
        // later report for the same date wins
        assert_eq!(bars[1].close, 103.0);
    }

    #[test]
    fn empty_insert_leaves_symbol_absent() {
        let mut table = PriceTable::new();
        table.insert("XYZ", vec![]);
        assert!(!table.contains("XYZ"));
        assert!(table.is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut table = PriceTable::new();
        table.insert("rhm.de", vec![bar(d(2025, 1, 2), 500.0)]);
        assert!(table.contains("RHM.DE"));
        assert!(table.contains("rhm.de"));
        assert_eq!(table.symbols(), vec!["RHM.DE"]);
    }

    #[test]
    fn calendar_is_sorted_union() {
        let mut table = PriceTable::new();
        table.insert("A", vec![bar(d(2025, 1, 2), 1.0), bar(d(2025, 1, 6), 1.0)]);
        table.insert("B", vec![bar(d(2025, 1, 4), 1.0), bar(d(2025, 1, 2), 1.0)]);
        assert_eq!(
            table.calendar(),
            vec![d(2025, 1, 2), d(2025, 1, 4), d(2025, 1, 6)]
        );
    }

    #[test]
    fn aligned_closes_forward_fill() {
        let mut table = PriceTable::new();
        table.insert("A", vec![bar(d(2025, 1, 3), 10.0), bar(d(2025, 1, 6), 12.0)]);
        let calendar = vec![d(2025, 1, 2), d(2025, 1, 3), d(2025, 1, 4), d(2025, 1, 6)];
        assert_eq!(
            table.aligned_closes("A", &calendar),
            vec![None, Some(10.0), Some(10.0), Some(12.0)]
        );
    }

    #[test]
    fn aligned_closes_unknown_symbol_is_all_none() {
        let table = PriceTable::new();
        let calendar = vec![d(2025, 1, 2), d(2025, 1, 3)];
        assert_eq!(table.aligned_closes("NOPE", &calendar), vec![None, None]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  HistoryRequest & HistoryCache
// ═══════════════════════════════════════════════════════════════════

mod history_cache {
    use super::*;

    fn request(symbols: &[&str]) -> HistoryRequest {
        HistoryRequest::new(symbols.iter().copied(), d(2025, 1, 1), d(2025, 2, 1))
    }

    #[test]
    fn request_key_ignores_order_case_and_duplicates() {
        let a = request(&["TLT", "aapl", "AAPL"]);
        let b = request(&["AAPL", "tlt"]);
        assert_eq!(a, b);
        assert_eq!(a.symbols(), ["AAPL", "TLT"]);
    }

    #[test]
    fn request_key_depends_on_dates() {
        let a = HistoryRequest::new(["AAPL"], d(2025, 1, 1), d(2025, 2, 1));
        let b = HistoryRequest::new(["AAPL"], d(2025, 1, 1), d(2025, 2, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn miss_then_hit_counts() {
        let mut cache = HistoryCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);
        let key = request(&["AAPL"]);

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), Arc::new(PriceTable::new()));
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = HistoryCache::with_capacity(2);
        let a = request(&["A"]);
        let b = request(&["B"]);
        let c = request(&["C"]);
        cache.insert(a.clone(), Arc::new(PriceTable::new()));
        cache.insert(b.clone(), Arc::new(PriceTable::new()));
        cache.insert(c.clone(), Arc::new(PriceTable::new()));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&a));
        assert!(cache.contains(&b));
        assert!(cache.contains(&c));
    }

    #[test]
    fn reinserting_does_not_duplicate_order() {
        let mut cache = HistoryCache::with_capacity(2);
        let a = request(&["A"]);
        let b = request(&["B"]);
        cache.insert(a.clone(), Arc::new(PriceTable::new()));
        cache.insert(a.clone(), Arc::new(PriceTable::new()));
        cache.insert(b.clone(), Arc::new(PriceTable::new()));
        assert!(cache.contains(&a));
        assert!(cache.contains(&b));
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut cache = HistoryCache::with_capacity(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(request(&["A"]), Arc::new(PriceTable::new()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_entries_keeps_counters() {
        let mut cache = HistoryCache::default();
        let key = request(&["A"]);
        cache.insert(key.clone(), Arc::new(PriceTable::new()));
        let _ = cache.get(&key);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  DashboardParams
// ═══════════════════════════════════════════════════════════════════

mod dashboard_params {
    use super::*;

    #[test]
    fn defaults_span_one_year() {
        let params = DashboardParams::ending_on(d(2025, 6, 30));
        assert_eq!(params.start, d(2024, 6, 30));
        assert_eq!(params.initial_capital, 10_000.0);
        assert_eq!(params.refresh_interval_secs, None);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn start_must_precede_end() {
        let mut params = DashboardParams::ending_on(d(2025, 6, 30));
        params.start = params.end;
        assert!(matches!(params.validate(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn range_capped_at_ten_years() {
        let mut params = DashboardParams::ending_on(d(2025, 6, 30));
        params.start = d(2010, 1, 1);
        assert!(params.validate().is_err());
    }

    #[test]
    fn capital_minimum() {
        let mut params = DashboardParams::ending_on(d(2025, 6, 30));
        params.initial_capital = 999.0;
        assert!(params.validate().is_err());
        params.initial_capital = 1_000.0;
        assert!(params.validate().is_ok());
        params.initial_capital = f64::INFINITY;
        assert!(params.validate().is_err());
    }

    #[test]
    fn refresh_bounds() {
        let mut params = DashboardParams::ending_on(d(2025, 6, 30));
        params.refresh_interval_secs = Some(5);
        assert!(params.validate().is_err());
        params.refresh_interval_secs = Some(60);
        assert!(params.validate().is_ok());
        params.refresh_interval_secs = Some(7_200);
        assert!(params.validate().is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Series & Summary formatting
// ═══════════════════════════════════════════════════════════════════

mod series_and_summary {
    use super::*;

    #[test]
    fn empty_value_series_has_zero_return() {
        let series = ValueSeries {
            dates: vec![],
            growth: vec![],
            values: vec![],
            initial_capital: 5_000.0,
        };
        assert_eq!(series.total_return(), 0.0);
        assert_eq!(series.final_value(), 5_000.0);
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(format_percent(12.3456), "12.35");
        assert_eq!(format_percent(-3.1), "-3.10");
        assert_eq!(format_percent(0.0), "0.00");
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.999), "1,000.00");
        assert_eq!(format_money(12_345.678), "12,345.68");
        assert_eq!(format_money(1_234_567.0), "1,234,567.00");
        assert_eq!(format_money(-9_876.5), "-9,876.50");
    }

    #[test]
    fn summary_display_helpers() {
        let summary = PerformanceSummary {
            portfolio_return_pct: 10.0,
            benchmark_return_pct: -2.5,
            final_portfolio_value: 11_000.0,
        };
        assert_eq!(summary.portfolio_return_display(), "10.00");
        assert_eq!(summary.benchmark_return_display(), "-2.50");
        assert_eq!(summary.final_value_display(), "11,000.00");
    }
}
