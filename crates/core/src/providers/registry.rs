#[cfg(not(target_arch = "wasm32"))]
use tracing::warn;

use super::alphavantage::AlphaVantageProvider;
use super::traits::HistoryProvider;
#[cfg(not(target_arch = "wasm32"))]
use super::yahoo_finance::YahooFinanceProvider;

/// Ordered list of history providers.
///
/// The first registered provider is the primary source; the rest are tried
/// in order when it fails for a symbol.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn HistoryProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Yahoo Finance first, then Alpha Vantage when an API key is available.
    pub fn new_with_defaults(alphavantage_key: Option<&str>) -> Self {
        let mut registry = Self::new();

        // Not available on WASM (uses native reqwest/tokio connectors)
        #[cfg(not(target_arch = "wasm32"))]
        {
            match YahooFinanceProvider::new() {
                Ok(yahoo) => registry.register(Box::new(yahoo)),
                Err(e) => warn!("Yahoo Finance provider unavailable: {e}"),
            }
        }

        if let Some(key) = alphavantage_key.map(str::trim).filter(|k| !k.is_empty()) {
            registry.register(Box::new(AlphaVantageProvider::new(key.to_string())));
        }

        registry
    }

    /// Register a provider after all existing ones.
    pub fn register(&mut self, provider: Box<dyn HistoryProvider>) {
        self.providers.push(provider);
    }

    /// Providers in fallback order.
    pub fn providers(&self) -> impl Iterator<Item = &dyn HistoryProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
