//! Lead-Lag Screening Module
//!
//! Screens a symbol universe against one or more anchor assets, finding the
//! lag at which each target's returns best follow the anchor's, and ranks the
//! pairs that clear the liquidity and correlation gates.
//!
//! # Example
//!
//! ```ignore
//! use lagscreen::exchange::BinanceClient;
//! use lagscreen::screener::{ScreenerConfig, UniverseScreener};
//! use lagscreen::types::SystemClock;
//!
//! let client = BinanceClient::new()?;
//! let clock = SystemClock;
//! let screener = UniverseScreener::new(&client, &clock, ScreenerConfig::default())?;
//! let report = screener.run().await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod lag;

pub use config::ScreenerConfig;
pub use engine::{
    rank_records, AnchorFailure, ScreenReport, ScreeningRecord, TargetAttempt, TargetOutcome,
    UniverseScreener,
};
pub use error::ScreenerError;
pub use lag::{best_lag, AlignedPair, LagResult, ReturnSeries};
