use anyhow::{Context, Result};
use clap::Parser;
use portfolio_dashboard::config::{AppConfig, CliOverrides};
use portfolio_dashboard::server;
use portfolio_dashboard_core::providers::registry::ProviderRegistry;
use portfolio_dashboard_core::PortfolioDashboard;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Live portfolio dashboard: weighted ticker basket vs. a benchmark index",
    after_help = "EXAMPLES:
    # Serve the built-in portfolio on http://127.0.0.1:8501
    cargo run --release

    # Custom portfolio and port
    cargo run --release -- --config portfolio.json --port 9000"
)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8501)]
    port: u16,

    /// JSON config file (overrides PORTFOLIO_DASHBOARD_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of distinct ticker-set/date-range downloads kept in memory
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Page title
    #[arg(long)]
    title: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("portfolio_dashboard=info,portfolio_dashboard_core=info")
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    let args = Args::parse();

    let cli = CliOverrides {
        config_path: args.config,
        title: args.title,
        cache_capacity: args.cache_capacity,
    };
    let config = AppConfig::resolve(&cli)?;

    let registry = ProviderRegistry::new_with_defaults(config.alphavantage_api_key.as_deref());
    let dashboard =
        PortfolioDashboard::with_registry(config.portfolio, registry, config.cache_capacity)
            .context("failed to build dashboard")?;
    info!(
        "Portfolio \"{}\" with {} tickers, providers: {}",
        dashboard.config().name,
        dashboard.config().allocations.len(),
        dashboard.provider_names().join(", ")
    );

    server::run_server(&args.host, args.port, dashboard).await
}
