use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::price::PriceBar;
use super::traits::HistoryProvider;

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance history provider.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices (`^GSPC`), crypto pairs (`BTC-USD`).
/// - **Data**: Daily OHLCV. Bars are rescaled by the adjusted close so that
///   splits and dividends do not show up as price jumps.
///
/// **Note**: Not WASM-compatible (uses native reqwest/tokio).
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| api_error(format!("Failed to create connector: {e}")))?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month = time::Month::try_from(date.month() as u8)
            .map_err(|e| api_error(format!("Invalid month in {date}: {e}")))?;

        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| api_error(format!("Invalid date {date}: {e}")))?
            .with_hms(0, 0, 0)
            .map_err(|e| api_error(format!("Invalid time for {date}: {e}")))?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

fn api_error(message: String) -> CoreError {
    CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message,
    }
}

/// Scale a raw quote by its adjustment factor (adjclose / close).
fn adjusted_bar(date: NaiveDate, quote: &yahoo_finance_api::Quote) -> Option<PriceBar> {
    let close = if quote.adjclose.is_finite() && quote.adjclose > 0.0 {
        quote.adjclose
    } else {
        quote.close
    };
    if !close.is_finite() || close <= 0.0 {
        return None;
    }
    let factor = if quote.close.is_finite() && quote.close > 0.0 {
        close / quote.close
    } else {
        1.0
    };

    Some(PriceBar {
        date,
        open: quote.open * factor,
        high: quote.high * factor,
        low: quote.low * factor,
        close,
        volume: quote.volume,
    })
}

#[async_trait]
impl HistoryProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, CoreError> {
        let from = Self::to_offset_datetime(start)?;
        let to = Self::to_offset_datetime(end)?;

        let resp = self
            .connector
            .get_quote_history_interval(symbol, from, to, "1d")
            .await
            .map_err(|e| api_error(format!("Failed to fetch history for {symbol}: {e}")))?;

        let quotes = resp
            .quotes()
            .map_err(|e| api_error(format!("Failed to parse quotes for {symbol}: {e}")))?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                if date >= start && date < end {
                    adjusted_bar(date, q)
                } else {
                    None
                }
            })
            .collect();

        debug!("{PROVIDER_NAME}: {} bars for {symbol}", bars.len());
        Ok(bars)
    }
}
