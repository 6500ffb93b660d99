use anyhow::{Context, Result};
use portfolio_dashboard_core::models::portfolio::{Allocation, Benchmark, PortfolioConfig};
use portfolio_dashboard_core::models::price::DEFAULT_CACHE_CAPACITY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "PORTFOLIO_DASHBOARD_CONFIG";

/// Environment variable holding the Alpha Vantage API key.
pub const ALPHAVANTAGE_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// On-disk configuration. Every field is optional; anything left out falls
/// back to the built-in portfolio and defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub title: Option<String>,
    pub allocations: Option<Vec<AllocationEntry>>,
    pub benchmark: Option<BenchmarkEntry>,
    pub cache_capacity: Option<usize>,
    pub alphavantage_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationEntry {
    pub symbol: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkEntry {
    pub symbol: String,
    pub label: Option<String>,
}

impl FileConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid dashboard config JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub title: Option<String>,
    pub cache_capacity: Option<usize>,
}

/// Fully resolved settings the server starts with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub portfolio: PortfolioConfig,
    pub cache_capacity: usize,
    pub alphavantage_api_key: Option<String>,
}

impl AppConfig {
    /// Resolve settings with precedence CLI > environment > file > built-in.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let path = cli.config_path.clone().or_else(|| {
            std::env::var(CONFIG_PATH_ENV)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });

        let file = match &path {
            Some(path) => {
                info!("Loading dashboard config from {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };

        let env_key = std::env::var(ALPHAVANTAGE_KEY_ENV).ok();
        Self::from_parts(file, cli, env_key)
    }

    /// Merge already-loaded sources; `env_key` is the Alpha Vantage key from the environment.
    pub fn from_parts(file: FileConfig, cli: &CliOverrides, env_key: Option<String>) -> Result<Self> {
        let mut portfolio = PortfolioConfig::global_disruption();

        if let Some(entries) = file.allocations {
            portfolio.allocations = entries
                .into_iter()
                .map(|e| Allocation::new(e.symbol, e.weight))
                .collect();
        }
        if let Some(bench) = file.benchmark {
            let label = bench.label.unwrap_or_else(|| bench.symbol.clone());
            portfolio.benchmark = Benchmark::new(bench.symbol, label);
        }
        if let Some(title) = cli.title.clone().or(file.title) {
            portfolio.name = title;
        }

        portfolio
            .validate()
            .context("dashboard config describes an invalid portfolio")?;

        let cache_capacity = cli
            .cache_capacity
            .or(file.cache_capacity)
            .unwrap_or(DEFAULT_CACHE_CAPACITY);
        if cache_capacity == 0 {
            warn!("cache capacity 0 requested; keeping a single entry");
        }

        let alphavantage_api_key = env_key
            .or(file.alphavantage_api_key)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            portfolio,
            cache_capacity: cache_capacity.max(1),
            alphavantage_api_key,
        })
    }
}
