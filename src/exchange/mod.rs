//! Market Data Abstraction Layer
//!
//! This module provides the exchange-agnostic data source used by the
//! history assembler and the screener. New venues can be added by
//! implementing `MarketDataProvider` without touching screening logic.

pub mod binance;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

// Re-export shared types for convenience
pub use crate::types::{Interval, PricePoint};

pub use binance::BinanceClient;

/// Errors raised by a market data provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Source of symbols, candles and liquidity figures.
///
/// Calls are awaited one at a time by the screener; implementations do not
/// need to support concurrent use beyond `Send + Sync`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Symbols quoted in `quote_asset` with the given trading `status`,
    /// sorted ascending and deduplicated.
    async fn list_symbols(
        &self,
        quote_asset: &str,
        status: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Close prices for `[start, end]`. The provider may cap the number of
    /// points returned per call; callers paginate.
    async fn get_candles(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, ProviderError>;

    /// Recent aggregate quote volume (24h). Malformed payloads yield zero.
    async fn recent_quote_volume(&self, symbol: &str) -> Result<Decimal, ProviderError>;
}
