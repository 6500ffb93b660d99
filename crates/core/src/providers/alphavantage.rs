use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::PriceBar;
use super::traits::HistoryProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_NAME: &str = "Alpha Vantage";

/// Alpha Vantage daily-adjusted history, used as a fallback source.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (`ALPHAVANTAGE_API_KEY` or the config file).
/// - **Coverage**: US and major international equities; no indices.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyAdjusted>>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    /// Rate-limit and premium-endpoint notices arrive here.
    #[serde(rename = "Information", alias = "Note")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct DailyAdjusted {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: String,
    #[serde(rename = "6. volume")]
    volume: String,
}

impl DailyAdjusted {
    fn to_bar(&self, date: NaiveDate) -> Option<PriceBar> {
        let close: f64 = self.close.parse().ok()?;
        let adjusted: f64 = self.adjusted_close.parse().ok()?;
        if !adjusted.is_finite() || adjusted <= 0.0 {
            return None;
        }
        let factor = if close > 0.0 { adjusted / close } else { 1.0 };
        Some(PriceBar {
            date,
            open: self.open.parse::<f64>().ok()? * factor,
            high: self.high.parse::<f64>().ok()? * factor,
            low: self.low.parse::<f64>().ok()? * factor,
            close: adjusted,
            volume: self.volume.parse().unwrap_or(0),
        })
    }
}

/// Turn a raw response into sorted bars within `[start, end)`.
fn parse_time_series(
    symbol: &str,
    resp: TimeSeriesResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, CoreError> {
    let time_series = match resp.time_series {
        Some(series) => series,
        None => {
            let reason = resp
                .error_message
                .or(resp.information)
                .unwrap_or_else(|| "API limit may be exceeded".to_string());
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("No time series data for {symbol}: {reason}"),
            });
        }
    };

    let mut bars: Vec<PriceBar> = time_series
        .iter()
        .filter_map(|(date_str, data)| {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
            if date >= start && date < end {
                data.to_bar(date)
            } else {
                None
            }
        })
        .collect();

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// Parse a raw JSON body; exposed for tests that replay recorded responses.
pub fn parse_daily_adjusted(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, CoreError> {
    let resp: TimeSeriesResponse = serde_json::from_str(body)?;
    parse_time_series(symbol, resp, start, end)
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl HistoryProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, CoreError> {
        let resp: TimeSeriesResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", &symbol.to_uppercase()),
                ("outputsize", "full"),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to parse time series for {symbol}: {e}"),
            })?;

        parse_time_series(symbol, resp, start, end)
    }
}
