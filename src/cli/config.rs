//! CLI configuration structs bridging CLI arguments to domain types.
//!
//! These structs decouple the CLI parsing layer from the screening and
//! signal logic, so command handlers work with validated, typed configs.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::screener::config::MAX_LOOKBACK_DAYS;
use crate::screener::{ScreenerConfig, ScreenerError};
use crate::strategy::{CoinDescriptor, PumpFollowRule, StrategyMetadata};
use crate::types::Interval;

/// Errors that can occur when turning CLI values into domain configs.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("At least one symbol is required for {0}")]
    EmptySymbols(&'static str),

    #[error("{0}")]
    InvalidInterval(String),

    #[error("Invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid screener configuration: {0}")]
    Screener(String),

    #[error(transparent)]
    ConfigFile(#[from] ScreenerError),
}

/// Split a comma-separated symbol list, trimming and uppercasing entries.
pub fn parse_symbol_list(raw: &str, what: &'static str) -> Result<Vec<String>, CliConfigError> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(CliConfigError::EmptySymbols(what));
    }
    Ok(symbols)
}

fn parse_interval(raw: &str) -> Result<Interval, CliConfigError> {
    raw.parse().map_err(CliConfigError::InvalidInterval)
}

/// CLI values for the `screen` subcommand.
///
/// Every screener setting is optional: unset values come from the `--config`
/// file when one is given, otherwise from `ScreenerConfig::default()`.
#[derive(Debug, Clone, Default)]
pub struct ScreenCliConfig {
    pub config_path: Option<String>,
    pub anchors: Option<String>,
    pub symbols: Option<String>,
    pub quote_asset: Option<String>,
    pub status: Option<String>,
    pub interval: Option<String>,
    pub lookback_days: Option<u32>,
    pub max_lag: Option<usize>,
    pub min_volume: Option<Decimal>,
    pub min_correlation: Option<f64>,
    pub throttle_ms: Option<u64>,
    pub max_points_per_request: Option<usize>,
    pub output: String,
}

impl ScreenCliConfig {
    /// Build and validate the screener config.
    ///
    /// # Errors
    /// Returns `CliConfigError` for unreadable config files, malformed flag
    /// values, or a merged config that fails validation.
    pub fn to_screener_config(&self) -> Result<ScreenerConfig, CliConfigError> {
        let mut config = match &self.config_path {
            Some(path) => ScreenerConfig::from_json_file(path)?,
            None => ScreenerConfig::default(),
        };

        if let Some(anchors) = &self.anchors {
            config.anchors = parse_symbol_list(anchors, "--anchors")?;
        }
        if let Some(quote) = &self.quote_asset {
            config.quote_asset = quote.trim().to_uppercase();
        }
        if let Some(status) = &self.status {
            config.symbol_status = status.trim().to_uppercase();
        }
        if let Some(interval) = &self.interval {
            config.interval = parse_interval(interval)?;
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        if let Some(max_lag) = self.max_lag {
            config.max_lag = max_lag;
        }
        if let Some(volume) = self.min_volume {
            config.min_liquidity = volume;
        }
        if let Some(correlation) = self.min_correlation {
            config.min_abs_correlation = correlation;
        }
        if let Some(throttle) = self.throttle_ms {
            config.request_throttle_ms = throttle;
        }
        if let Some(max_points) = self.max_points_per_request {
            config.max_points_per_request = max_points;
        }

        config.validate().map_err(CliConfigError::Screener)?;
        Ok(config)
    }

    /// Explicit target universe, if `--symbols` was given.
    pub fn universe(&self) -> Result<Option<Vec<String>>, CliConfigError> {
        self.symbols
            .as_deref()
            .map(|raw| parse_symbol_list(raw, "--symbols"))
            .transpose()
    }
}

/// CLI values for the `signals` subcommand.
#[derive(Debug, Clone)]
pub struct SignalsCliConfig {
    pub target: String,
    pub anchor: String,
    pub interval: String,
    pub lookback_days: u32,
    pub pump_threshold: Decimal,
    pub output: Option<String>,
}

impl SignalsCliConfig {
    pub fn interval(&self) -> Result<Interval, CliConfigError> {
        parse_interval(&self.interval)
    }

    /// Rule configured with the CLI threshold and the chosen coins.
    pub fn to_rule(&self) -> Result<PumpFollowRule, CliConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(CliConfigError::InvalidNumber {
                field: "--lookback-days",
                value: self.lookback_days.to_string(),
            });
        }
        let interval = self.interval()?;
        if self.pump_threshold <= Decimal::ZERO {
            return Err(CliConfigError::InvalidNumber {
                field: "--pump-threshold",
                value: self.pump_threshold.to_string(),
            });
        }
        let timeframe = interval.as_str().to_uppercase();

        Ok(PumpFollowRule {
            pump_threshold_pct: self.pump_threshold,
            metadata: StrategyMetadata {
                target: CoinDescriptor::new(self.target.to_uppercase(), timeframe.clone()),
                anchors: vec![CoinDescriptor::new(self.anchor.to_uppercase(), timeframe)],
            },
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Signal;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn screen_args() -> ScreenCliConfig {
        ScreenCliConfig {
            output: "lag_screener_results.csv".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_symbol_list_trims_and_uppercases() {
        let symbols = parse_symbol_list(" btcusdt, ETHUSDT ,,sol usdt", "--anchors").unwrap();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOL USDT"]);
        assert!(matches!(
            parse_symbol_list(" , ", "--anchors"),
            Err(CliConfigError::EmptySymbols("--anchors"))
        ));
    }

    #[test]
    fn test_no_flags_gives_defaults() {
        let config = screen_args().to_screener_config().unwrap();
        assert_eq!(config, ScreenerConfig::default());
        assert_eq!(screen_args().universe().unwrap(), None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = ScreenCliConfig {
            anchors: Some("ethusdt".to_string()),
            interval: Some("4h".to_string()),
            max_lag: Some(24),
            min_volume: Some(dec!(1000000)),
            min_correlation: Some(0.2),
            symbols: Some("LUMIAUSDT,ARBUSDT".to_string()),
            ..screen_args()
        };
        let config = args.to_screener_config().unwrap();

        assert_eq!(config.anchors, vec!["ETHUSDT"]);
        assert_eq!(config.interval, Interval::FourHour);
        assert_eq!(config.max_lag, 24);
        assert_eq!(config.min_liquidity, dec!(1000000));
        assert_eq!(config.min_abs_correlation, 0.2);
        assert_eq!(
            args.universe().unwrap(),
            Some(vec!["LUMIAUSDT".to_string(), "ARBUSDT".to_string()])
        );
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"anchors": ["SOLUSDT"], "max_lag": 4, "lookback_days": 30}}"#).unwrap();

        let args = ScreenCliConfig {
            config_path: Some(file.path().to_string_lossy().into_owned()),
            max_lag: Some(8),
            ..screen_args()
        };
        let config = args.to_screener_config().unwrap();

        assert_eq!(config.anchors, vec!["SOLUSDT"]);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.max_lag, 8);
    }

    #[test]
    fn test_unknown_interval_rejected() {
        let args = ScreenCliConfig {
            interval: Some("7h".to_string()),
            ..screen_args()
        };
        assert!(matches!(
            args.to_screener_config(),
            Err(CliConfigError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let args = ScreenCliConfig {
            min_correlation: Some(-0.1),
            ..screen_args()
        };
        assert!(matches!(args.to_screener_config(), Err(CliConfigError::Screener(_))));

        let args = ScreenCliConfig {
            min_volume: Some(dec!(-1)),
            ..screen_args()
        };
        assert!(matches!(args.to_screener_config(), Err(CliConfigError::Screener(_))));

        let args = ScreenCliConfig {
            lookback_days: Some(200_000_000),
            ..screen_args()
        };
        assert!(matches!(args.to_screener_config(), Err(CliConfigError::Screener(_))));
    }

    #[test]
    fn test_signals_rule_from_cli() {
        let args = SignalsCliConfig {
            target: "arbusdt".to_string(),
            anchor: "btcusdt".to_string(),
            interval: "1h".to_string(),
            lookback_days: 7,
            pump_threshold: dec!(2),
            output: None,
        };
        let rule = args.to_rule().unwrap();

        assert_eq!(rule.pump_threshold_pct, dec!(2));
        assert_eq!(rule.entry_offset, 3);
        assert_eq!(rule.exit_offset, 6);
        assert_eq!(rule.metadata.target, CoinDescriptor::new("ARBUSDT", "1H"));
        assert_eq!(rule.metadata.anchors[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_signals_rejects_non_positive_threshold() {
        let args = SignalsCliConfig {
            target: "LUMIAUSDT".to_string(),
            anchor: "ETHUSDT".to_string(),
            interval: "1h".to_string(),
            lookback_days: 7,
            pump_threshold: dec!(0),
            output: None,
        };
        assert!(args.to_rule().is_err());
    }

    fn signals_args(pump_threshold: Decimal, lookback_days: u32) -> SignalsCliConfig {
        SignalsCliConfig {
            target: "LUMIAUSDT".to_string(),
            anchor: "ETHUSDT".to_string(),
            interval: "1h".to_string(),
            lookback_days,
            pump_threshold,
            output: None,
        }
    }

    #[test]
    fn test_signals_rejects_lookback_beyond_calendar() {
        let result = signals_args(dec!(1.5), 200_000_000).to_rule();
        assert!(matches!(
            result,
            Err(CliConfigError::InvalidNumber { field: "--lookback-days", .. })
        ));
        assert!(signals_args(dec!(1.5), MAX_LOOKBACK_DAYS).to_rule().is_ok());
    }

    #[test]
    fn test_pump_threshold_parsed_exactly() {
        let threshold: Decimal = "1.1".parse().unwrap();
        let rule = signals_args(threshold, 7).to_rule().unwrap();
        assert_eq!(rule.pump_threshold_pct, dec!(1.1));

        // anchor moves exactly 1.1% between the first two closes
        let mut closes = vec![dec!(100)];
        closes.extend(std::iter::repeat(dec!(101.1)).take(8));
        let overlay = rule.overlay(&closes).unwrap();
        assert_eq!(overlay.get(5), Signal::Buy);
        assert_eq!(overlay.get(8), Signal::Sell);
    }
}
