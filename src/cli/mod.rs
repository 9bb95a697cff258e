//! CLI argument parsing using clap.
//!
//! This module defines the command-line interface for lagscreen,
//! including all subcommands and their arguments.

mod config;

pub use config::{parse_symbol_list, CliConfigError, ScreenCliConfig, SignalsCliConfig};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// lagscreen - Lead-lag correlation screener
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Screen the symbol universe for targets that follow the anchors
    Screen {
        /// JSON file with screener settings; flags below override it
        #[arg(long)]
        config: Option<String>,
        /// Anchor symbols (comma-separated) [default: BTCUSDT,ETHUSDT,SOLUSDT]
        #[arg(long)]
        anchors: Option<String>,
        /// Explicit target universe (comma-separated); skips exchange listing
        #[arg(long)]
        symbols: Option<String>,
        /// Quote asset for the listed universe [default: USDT]
        #[arg(long)]
        quote_asset: Option<String>,
        /// Required symbol status [default: TRADING]
        #[arg(long)]
        status: Option<String>,
        /// Candle interval (1m, 5m, 1h, 4h, 1d, ...) [default: 1h]
        #[arg(long)]
        interval: Option<String>,
        /// Historical lookback period in days [default: 180]
        #[arg(long)]
        lookback_days: Option<u32>,
        /// Largest lag searched, in candles [default: 12]
        #[arg(long)]
        max_lag: Option<usize>,
        /// Minimum 24h quote volume [default: 5000000]
        #[arg(long)]
        min_volume: Option<Decimal>,
        /// Minimum absolute correlation [default: 0.03]
        #[arg(long)]
        min_correlation: Option<f64>,
        /// Pause between candle requests in milliseconds [default: 300]
        #[arg(long)]
        throttle_ms: Option<u64>,
        /// Candles requested per call [default: 1000]
        #[arg(long)]
        max_points_per_request: Option<usize>,
        /// Output file (.json for JSON, otherwise CSV)
        #[arg(long, default_value = "lag_screener_results.csv")]
        output: String,
    },

    /// Evaluate the pump-follow rule for a target against an anchor
    Signals {
        /// Symbol being traded
        #[arg(long, default_value = "LUMIAUSDT")]
        target: String,
        /// Symbol whose pumps trigger entries
        #[arg(long, default_value = "ETHUSDT")]
        anchor: String,
        /// Candle interval
        #[arg(long, default_value = "1h")]
        interval: String,
        /// Historical lookback period in days
        #[arg(long, default_value_t = 30)]
        lookback_days: u32,
        /// Anchor move (percent) that counts as a pump
        #[arg(long, default_value_t = dec!(1.5))]
        pump_threshold: Decimal,
        /// Optional CSV output path
        #[arg(long)]
        output: Option<String>,
    },

    /// List the symbol universe the screener would use
    Symbols {
        /// Quote asset
        #[arg(long, default_value = "USDT")]
        quote_asset: String,
        /// Required symbol status
        #[arg(long, default_value = "TRADING")]
        status: String,
    },
}
