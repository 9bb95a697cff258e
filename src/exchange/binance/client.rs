//! Binance Spot REST client implementing `MarketDataProvider`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::exchange::{Interval, MarketDataProvider, PricePoint, ProviderError};

/// Public REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Hard cap Binance applies to a single klines request
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Requests per second we allow ourselves (Binance weight budget is 6000/min)
const RATE_LIMIT: NonZeroU32 = match NonZeroU32::new(10) {
    Some(v) => v,
    None => panic!("RATE_LIMIT must be non-zero"),
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    quote_volume: String,
}

pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl BinanceClient {
    /// Creates a client for the public Binance API.
    ///
    /// `BINANCE_API_BASE_URL` overrides the endpoint (e.g. a regional mirror).
    pub fn new() -> Result<Self, ProviderError> {
        let base_url =
            std::env::var("BINANCE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let quota = Quota::per_second(RATE_LIMIT);

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// GET `path` and return the status plus raw body.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(reqwest::StatusCode, String), ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(path = path, status = status.as_u16(), bytes = body.len(), "Binance response");
        Ok((status, body))
    }

    /// Like `get`, but non-2xx statuses become `ProviderError::Http`.
    async fn get_ok(&self, path: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let (status, body) = self.get(path, query).await?;
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn list_symbols(
        &self,
        quote_asset: &str,
        status: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let body = self.get_ok("/api/v3/exchangeInfo", &[]).await?;
        parse_symbol_list(&body, quote_asset, status)
    }

    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", interval.as_str().to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("endTime", end.timestamp_millis().to_string()),
            ("limit", MAX_KLINES_PER_REQUEST.to_string()),
        ];
        let body = self.get_ok("/api/v3/klines", &query).await?;
        parse_klines(&body)
    }

    async fn recent_quote_volume(&self, symbol: &str) -> Result<Decimal, ProviderError> {
        let (status, body) = self
            .get("/api/v3/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;

        if !status.is_success() {
            warn!(symbol = %symbol, status = status.as_u16(), "Ticker request rejected, treating volume as zero");
            return Ok(Decimal::ZERO);
        }

        Ok(parse_quote_volume(&body).unwrap_or_else(|| {
            warn!(symbol = %symbol, "Malformed ticker payload, treating volume as zero");
            Decimal::ZERO
        }))
    }
}

/// Extract symbols matching quote asset and status from an exchangeInfo body.
fn parse_symbol_list(body: &str, quote_asset: &str, status: &str) -> Result<Vec<String>, ProviderError> {
    let info: ExchangeInfo =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(format!("exchangeInfo: {}", e)))?;

    let mut symbols: Vec<String> = info
        .symbols
        .into_iter()
        .filter(|s| s.quote_asset == quote_asset && s.status == status)
        .map(|s| s.symbol)
        .collect();
    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

/// Parse a klines body: `[[openTime, open, high, low, close, ...], ...]`.
fn parse_klines(body: &str) -> Result<Vec<PricePoint>, ProviderError> {
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(format!("klines: {}", e)))?;

    rows.iter()
        .map(|row| {
            let open_time = row
                .first()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ProviderError::Decode("kline missing open time".to_string()))?;
            let close = row
                .get(4)
                .and_then(|v| v.as_str())
                .ok_or_else(|| ProviderError::Decode("kline missing close".to_string()))?;

            let timestamp = DateTime::from_timestamp_millis(open_time)
                .ok_or_else(|| ProviderError::Decode(format!("open time out of range: {}", open_time)))?;
            let close = Decimal::from_str(close)
                .map_err(|e| ProviderError::Decode(format!("close '{}': {}", close, e)))?;

            Ok(PricePoint::new(timestamp, close))
        })
        .collect()
}

/// `quoteVolume` from a 24h ticker body, `None` when absent or unparseable.
fn parse_quote_volume(body: &str) -> Option<Decimal> {
    let ticker: Ticker24h = serde_json::from_str(body).ok()?;
    Decimal::from_str(&ticker.quote_volume).ok()
}
