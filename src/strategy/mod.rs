//! Signal rules evaluated over assembled price history.

pub mod pump_follow;

pub use pump_follow::{CoinDescriptor, PumpFollowRule, SignalOverlay, StrategyMetadata};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::PriceSeries;

/// Represents a trading signal.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(label)
    }
}

/// A signal attached to the candle it applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedSignal {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// The rule could not be evaluated; no signals are produced
    #[error("Signal evaluation failed: {0}")]
    Evaluation(String),
}

/// Rule contract: target timestamps plus anchor closes in, labelled rows out.
pub trait SignalRule {
    /// One signal per target timestamp that also has an anchor close.
    fn evaluate(
        &self,
        target_timestamps: &[DateTime<Utc>],
        anchor: &PriceSeries,
    ) -> Result<Vec<TimedSignal>, RuleError>;

    /// Coins the rule trades and watches
    fn metadata(&self) -> StrategyMetadata;
}
