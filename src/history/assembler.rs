//! History assembly: window → paginated fetch → deduplicated series.

use chrono::Duration as ChronoDuration;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::chunks::CandleChunks;
use super::HistoryError;
use crate::exchange::{Interval, MarketDataProvider};
use crate::types::{Clock, PriceSeries};

/// Builds complete close series for a symbol over a lookback window.
pub struct HistoryAssembler<'a, P: MarketDataProvider + ?Sized> {
    provider: &'a P,
    clock: &'a dyn Clock,
    max_points_per_request: usize,
    throttle: Duration,
}

impl<'a, P: MarketDataProvider + ?Sized> HistoryAssembler<'a, P> {
    /// # Arguments
    /// * `max_points_per_request` - Provider cap on candles per call
    /// * `throttle` - Pause between consecutive chunk requests
    pub fn new(
        provider: &'a P,
        clock: &'a dyn Clock,
        max_points_per_request: usize,
        throttle: Duration,
    ) -> Self {
        Self {
            provider,
            clock,
            max_points_per_request,
            throttle,
        }
    }

    /// Assemble `lookback_days` of `interval` candles ending now.
    ///
    /// # Errors
    /// Any failed chunk aborts the whole symbol with `HistoryError::Provider`;
    /// a window with no candles at all is `HistoryError::NoData`. A lookback
    /// past the calendar's range is `HistoryError::InvalidWindow`.
    pub async fn assemble(
        &self,
        symbol: &str,
        interval: Interval,
        lookback_days: u32,
    ) -> Result<PriceSeries, HistoryError> {
        let end = self.clock.now();
        let start = ChronoDuration::try_days(i64::from(lookback_days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| HistoryError::InvalidWindow {
                symbol: symbol.to_string(),
                lookback_days,
            })?;

        info!(
            symbol = %symbol,
            interval = %interval,
            start = %start.format("%Y-%m-%d %H:%M"),
            end = %end.format("%Y-%m-%d %H:%M"),
            "Downloading history"
        );

        let mut chunks = CandleChunks::new(
            self.provider,
            symbol,
            interval,
            start,
            end,
            self.max_points_per_request,
        );
        let mut points = Vec::new();

        while let Some(chunk) = chunks.next_chunk().await {
            let chunk = chunk.map_err(|source| HistoryError::Provider {
                symbol: symbol.to_string(),
                source,
            })?;
            points.extend(chunk);

            // Rate limiting
            if !chunks.is_finished() && !self.throttle.is_zero() {
                sleep(self.throttle).await;
            }
        }

        let raw_len = points.len();
        let series = PriceSeries::from_points(symbol, interval, points);
        if series.is_empty() {
            return Err(HistoryError::NoData {
                symbol: symbol.to_string(),
            });
        }

        debug!(
            symbol = %symbol,
            chunks = chunks.chunks_fetched(),
            raw = raw_len,
            unique = series.len(),
            "History assembled"
        );

        Ok(series)
    }
}
