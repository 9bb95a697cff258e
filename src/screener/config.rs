//! Configuration for the lag-correlation screener

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use super::ScreenerError;
use crate::exchange::binance::client::MAX_KLINES_PER_REQUEST;
use crate::types::Interval;

/// Default leader assets screened against the universe
pub const DEFAULT_ANCHORS: &[&str] = &["BTCUSDT", "ETHUSDT", "SOLUSDT"];

/// Longest accepted lookback (roughly a century of candles)
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Configuration for a screening run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Leader symbols, processed in declared order
    #[serde(default = "default_anchors")]
    pub anchors: Vec<String>,

    /// Quote asset used to build the universe (e.g. USDT)
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Exchange trading status a symbol must have to be listed
    #[serde(default = "default_symbol_status")]
    pub symbol_status: String,

    /// Candle interval
    #[serde(default = "default_interval")]
    pub interval: Interval,

    /// Historical lookback period in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Largest lag (in periods) searched; lags 1..=max_lag
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,

    /// Minimum 24h quote volume for a target to be analyzed
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: Decimal,

    /// Minimum |correlation| for a record to be kept (0.0-1.0)
    #[serde(default = "default_min_abs_correlation")]
    pub min_abs_correlation: f64,

    /// Pause between consecutive candle chunk requests
    #[serde(default = "default_request_throttle_ms")]
    pub request_throttle_ms: u64,

    /// Provider cap on candles per request
    #[serde(default = "default_max_points_per_request")]
    pub max_points_per_request: usize,
}

fn default_anchors() -> Vec<String> {
    DEFAULT_ANCHORS.iter().map(|s| s.to_string()).collect()
}
fn default_quote_asset() -> String {
    "USDT".to_string()
}
fn default_symbol_status() -> String {
    "TRADING".to_string()
}
fn default_interval() -> Interval {
    Interval::OneHour
}
fn default_lookback_days() -> u32 {
    180
}
fn default_max_lag() -> usize {
    12
}
fn default_min_liquidity() -> Decimal {
    dec!(5_000_000)
}
fn default_min_abs_correlation() -> f64 {
    0.03
}
fn default_request_throttle_ms() -> u64 {
    300
}
fn default_max_points_per_request() -> usize {
    MAX_KLINES_PER_REQUEST
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            anchors: default_anchors(),
            quote_asset: default_quote_asset(),
            symbol_status: default_symbol_status(),
            interval: default_interval(),
            lookback_days: default_lookback_days(),
            max_lag: default_max_lag(),
            min_liquidity: default_min_liquidity(),
            min_abs_correlation: default_min_abs_correlation(),
            request_throttle_ms: default_request_throttle_ms(),
            max_points_per_request: default_max_points_per_request(),
        }
    }
}

impl ScreenerConfig {
    /// Create a config with custom anchors
    pub fn with_anchors(anchors: Vec<String>) -> Self {
        Self {
            anchors,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScreenerError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate().map_err(ScreenerError::InvalidConfig)?;
        Ok(config)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.request_throttle_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.anchors.is_empty() {
            return Err("anchors list cannot be empty".to_string());
        }
        let mut seen = HashSet::new();
        for anchor in &self.anchors {
            if anchor.trim().is_empty() {
                return Err("anchor symbols cannot be blank".to_string());
            }
            if !seen.insert(anchor.as_str()) {
                return Err(format!("duplicate anchor: {}", anchor));
            }
        }
        if self.lookback_days == 0 {
            return Err("lookback_days must be at least 1".to_string());
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(format!(
                "lookback_days cannot exceed {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            ));
        }
        if self.max_lag == 0 {
            return Err("max_lag must be at least 1".to_string());
        }
        if self.min_liquidity < Decimal::ZERO {
            return Err("min_liquidity cannot be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_abs_correlation) {
            return Err(format!(
                "min_abs_correlation must be between 0.0 and 1.0, got {}",
                self.min_abs_correlation
            ));
        }
        if self.max_points_per_request == 0 {
            return Err("max_points_per_request must be at least 1".to_string());
        }
        Ok(())
    }
}
