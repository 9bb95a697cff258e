//! Chunked candle pagination.
//!
//! `CandleChunks` walks a time window in provider-sized requests. Each
//! request starts one interval after the last candle actually received, so a
//! provider that truncates a response never leaves a gap.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::exchange::{Interval, MarketDataProvider, PricePoint, ProviderError};

/// Finite, non-restartable sequence of candle chunks for one symbol.
///
/// The pager is exhausted after the first empty chunk, the first error, or
/// once the cursor passes the end of the window.
pub struct CandleChunks<'a, P: MarketDataProvider + ?Sized> {
    provider: &'a P,
    symbol: &'a str,
    interval: Interval,
    cursor: DateTime<Utc>,
    window_end: DateTime<Utc>,
    chunk_span: Duration,
    chunks_fetched: usize,
    finished: bool,
}

impl<'a, P: MarketDataProvider + ?Sized> CandleChunks<'a, P> {
    /// # Arguments
    /// * `max_points` - Provider cap on candles per request (must be > 0)
    pub fn new(
        provider: &'a P,
        symbol: &'a str,
        interval: Interval,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        max_points: usize,
    ) -> Self {
        // Spans too large to represent cover the whole window in one request
        let chunk_span = i64::try_from(max_points.max(1))
            .ok()
            .and_then(|points| interval.minutes().checked_mul(points))
            .and_then(Duration::try_minutes)
            .unwrap_or_else(|| window_end.signed_duration_since(window_start));

        Self {
            provider,
            symbol,
            interval,
            cursor: window_start,
            window_end,
            chunk_span,
            chunks_fetched: 0,
            finished: window_start >= window_end,
        }
    }

    /// Fetch the next chunk, or `None` once the window is exhausted.
    pub async fn next_chunk(&mut self) -> Option<Result<Vec<PricePoint>, ProviderError>> {
        if self.finished {
            return None;
        }

        let chunk_end = self
            .cursor
            .checked_add_signed(self.chunk_span)
            .map_or(self.window_end, |end| end.min(self.window_end));
        let chunk = match self
            .provider
            .get_candles(self.symbol, self.interval, self.cursor, chunk_end)
            .await
        {
            Ok(chunk) => chunk,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        let Some(last_ts) = chunk.iter().map(|p| p.timestamp).max() else {
            self.finished = true;
            return None;
        };

        self.chunks_fetched += 1;
        let next_cursor = last_ts.checked_add_signed(self.interval.duration());

        debug!(
            symbol = %self.symbol,
            chunk = self.chunks_fetched,
            candles = chunk.len(),
            from = %self.cursor,
            to = %chunk_end,
            "Fetched candle chunk"
        );

        // A provider echoing old data must not keep us looping forever
        match next_cursor {
            Some(next) if next > self.cursor && next < self.window_end => self.cursor = next,
            _ => self.finished = true,
        }

        Some(Ok(chunk))
    }

    /// True once `next_chunk` will return `None`
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of non-empty chunks received so far
    pub fn chunks_fetched(&self) -> usize {
        self.chunks_fetched
    }
}
