//! Historical close-price assembly.
//!
//! Pages through a `MarketDataProvider` to build complete, deduplicated,
//! time-ordered close series over a lookback window.

pub mod assembler;
pub mod chunks;

pub use assembler::HistoryAssembler;
pub use chunks::CandleChunks;

use crate::exchange::ProviderError;
use thiserror::Error;

/// Errors that can occur while assembling a symbol's history
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A chunk request failed; the symbol's history is unusable
    #[error("Failed to fetch history for {symbol}: {source}")]
    Provider {
        symbol: String,
        #[source]
        source: ProviderError,
    },

    /// Lookback reaches outside the representable date range
    #[error("Lookback of {lookback_days} days is out of range for {symbol}")]
    InvalidWindow { symbol: String, lookback_days: u32 },

    /// Provider returned no candles for the whole window
    #[error("No candles returned for {symbol}")]
    NoData { symbol: String },
}
