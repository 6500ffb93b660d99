use thiserror::Error;

/// Unified error type for the entire portfolio-dashboard-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Serialization ───────────────────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No price history provider registered")]
    NoProvider,

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("None of the configured tickers returned price data")]
    NoValidTickers,

    #[error("Benchmark {0} returned no price data")]
    BenchmarkUnavailable(String),

    #[error("No price data between {start} and {end}")]
    EmptyPriceHistory { start: String, end: String },
}

impl CoreError {
    /// True for failures caused by the request parameters rather than the data source.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::ValidationError(_))
    }

    /// True when the remote data source could not be reached or answered badly.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            CoreError::Api { .. } | CoreError::Network(_) | CoreError::NoProvider
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, including the apikey query parameter
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
