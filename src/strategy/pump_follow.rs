//! Pump-follow rule
//!
//! When the anchor closes at least `pump_threshold_pct` above its previous
//! close, the target is bought `entry_offset` candles later and sold
//! `exit_offset` candles later.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::{RuleError, Signal, SignalRule, TimedSignal};
use crate::types::PriceSeries;

/// Symbol and timeframe of a coin used by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinDescriptor {
    pub symbol: String,
    pub timeframe: String,
}

impl CoinDescriptor {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub target: CoinDescriptor,
    pub anchors: Vec<CoinDescriptor>,
}

impl Default for StrategyMetadata {
    fn default() -> Self {
        Self {
            target: CoinDescriptor::new("LUMIA", "1H"),
            anchors: vec![CoinDescriptor::new("ETH", "1H")],
        }
    }
}

/// Sparse index → signal map over a fixed number of rows.
///
/// Unmarked rows read as HOLD; marking an index twice keeps the last mark.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalOverlay {
    len: usize,
    marks: BTreeMap<usize, Signal>,
}

impl SignalOverlay {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            marks: BTreeMap::new(),
        }
    }

    /// Marks outside the overlay are dropped.
    pub fn mark(&mut self, index: usize, signal: Signal) {
        if index < self.len {
            self.marks.insert(index, signal);
        }
    }

    pub fn get(&self, index: usize) -> Signal {
        self.marks.get(&index).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-HOLD rows
    pub fn marked(&self) -> usize {
        self.marks.len()
    }

    pub fn to_signals(&self) -> Vec<Signal> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// Buy the target a few candles after an anchor pump, sell a few candles later
#[derive(Debug, Clone, PartialEq)]
pub struct PumpFollowRule {
    /// Minimum anchor close-to-close move, in percent
    pub pump_threshold_pct: Decimal,
    /// Candles after detection to BUY
    pub entry_offset: usize,
    /// Candles after detection to SELL
    pub exit_offset: usize,
    pub metadata: StrategyMetadata,
}

impl Default for PumpFollowRule {
    fn default() -> Self {
        Self {
            pump_threshold_pct: dec!(1.5),
            entry_offset: 3,
            exit_offset: 6,
            metadata: StrategyMetadata::default(),
        }
    }
}

impl PumpFollowRule {
    /// Anchor closes at the target timestamps, in target order.
    fn join(target_timestamps: &[DateTime<Utc>], anchor: &PriceSeries) -> Vec<(DateTime<Utc>, Decimal)> {
        let closes: HashMap<DateTime<Utc>, Decimal> = anchor
            .points()
            .iter()
            .map(|p| (p.timestamp, p.close))
            .collect();

        target_timestamps
            .iter()
            .filter_map(|ts| closes.get(ts).map(|close| (*ts, *close)))
            .collect()
    }

    /// Percent change from `prev` to `curr`, or None if `prev` is not positive.
    fn pump_pct(prev: Decimal, curr: Decimal, index: usize) -> Result<Option<Decimal>, RuleError> {
        if prev <= Decimal::ZERO {
            return Ok(None);
        }
        curr.checked_sub(prev)
            .and_then(|delta| delta.checked_div(prev))
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .map(Some)
            .ok_or_else(|| {
                RuleError::Evaluation(format!(
                    "decimal overflow computing move {} -> {} at row {}",
                    prev, curr, index
                ))
            })
    }

    /// Build the signal overlay over anchor closes already joined to the target.
    pub fn overlay(&self, closes: &[Decimal]) -> Result<SignalOverlay, RuleError> {
        let n = closes.len();
        let horizon = self.entry_offset.max(self.exit_offset);
        let mut overlay = SignalOverlay::new(n);

        // Row i looks at the move into i-1 so the rule only uses closed candles
        for i in 2..n.saturating_sub(horizon) {
            let Some(pct) = Self::pump_pct(closes[i - 2], closes[i - 1], i)? else {
                continue;
            };
            if pct >= self.pump_threshold_pct {
                debug!(row = i, pump_pct = %pct.round_dp(4), "Anchor pump detected");
                overlay.mark(i + self.entry_offset, Signal::Buy);
                overlay.mark(i + self.exit_offset, Signal::Sell);
            }
        }

        Ok(overlay)
    }
}

impl SignalRule for PumpFollowRule {
    fn evaluate(
        &self,
        target_timestamps: &[DateTime<Utc>],
        anchor: &PriceSeries,
    ) -> Result<Vec<TimedSignal>, RuleError> {
        let joined = Self::join(target_timestamps, anchor);
        let closes: Vec<Decimal> = joined.iter().map(|(_, c)| *c).collect();
        let overlay = self.overlay(&closes)?;

        debug!(
            rows = joined.len(),
            marked = overlay.marked(),
            anchor = %anchor.symbol(),
            "Signals evaluated"
        );

        Ok(joined
            .iter()
            .enumerate()
            .map(|(i, (timestamp, _))| TimedSignal {
                timestamp: *timestamp,
                signal: overlay.get(i),
            })
            .collect())
    }

    fn metadata(&self) -> StrategyMetadata {
        self.metadata.clone()
    }
}
