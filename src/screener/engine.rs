//! Universe screening: anchors × targets → ranked lead-lag records.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, error, info, warn};

use super::config::ScreenerConfig;
use super::error::ScreenerError;
use super::lag::{scan_lags, select_best, AlignedPair};
use crate::exchange::MarketDataProvider;
use crate::history::HistoryAssembler;
use crate::types::{Clock, PriceSeries};

/// A target that follows an anchor closely enough to be reported
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningRecord {
    pub anchor: String,
    pub target: String,
    /// Periods by which the target trails the anchor
    pub lag: usize,
    /// Pearson correlation at `lag`, unrounded
    pub correlation: f64,
    /// Target's 24h quote volume at screening time
    pub volume: Decimal,
}

/// What happened to one (anchor, target) attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Qualified(ScreeningRecord),
    /// History was analyzed but no lag cleared the correlation gate
    BelowThreshold { lag: Option<usize>, correlation: f64 },
    /// 24h quote volume under the liquidity floor; history never fetched
    SkippedLiquidity { volume: Decimal },
    /// Volume or history could not be fetched
    FailedFetch { reason: String },
}

impl TargetOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TargetOutcome::Qualified(_) => "qualified",
            TargetOutcome::BelowThreshold { .. } => "below_threshold",
            TargetOutcome::SkippedLiquidity { .. } => "skipped_liquidity",
            TargetOutcome::FailedFetch { .. } => "failed_fetch",
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, TargetOutcome::Qualified(_))
    }
}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetAttempt {
    pub anchor: String,
    pub target: String,
    pub outcome: TargetOutcome,
}

/// An anchor whose history could not be assembled; its targets were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorFailure {
    pub anchor: String,
    pub reason: String,
}

/// Result of a screening run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenReport {
    /// Qualified records, descending |correlation|
    pub records: Vec<ScreeningRecord>,
    /// Every attempt in processing order
    pub attempts: Vec<TargetAttempt>,
    pub failed_anchors: Vec<AnchorFailure>,
}

impl ScreenReport {
    /// Number of attempts whose outcome has the given label
    pub fn count(&self, label: &str) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.label() == label)
            .count()
    }
}

/// Sort records by descending |correlation|. Stable, so equal magnitudes keep
/// their discovery order.
pub fn rank_records(records: &mut [ScreeningRecord]) {
    records.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(Ordering::Equal)
    });
}

/// Screens a symbol universe against the configured anchors.
pub struct UniverseScreener<'a, P: MarketDataProvider + ?Sized> {
    provider: &'a P,
    clock: &'a dyn Clock,
    config: ScreenerConfig,
}

impl<'a, P: MarketDataProvider + ?Sized> UniverseScreener<'a, P> {
    /// # Errors
    /// `ScreenerError::InvalidConfig` if `config` fails validation.
    pub fn new(provider: &'a P, clock: &'a dyn Clock, config: ScreenerConfig) -> Result<Self, ScreenerError> {
        config.validate().map_err(ScreenerError::InvalidConfig)?;
        Ok(Self {
            provider,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Symbols quoted in the configured asset with the configured status,
    /// sorted and deduplicated.
    pub async fn discover_universe(&self) -> Result<Vec<String>, ScreenerError> {
        let mut symbols = self
            .provider
            .list_symbols(&self.config.quote_asset, &self.config.symbol_status)
            .await
            .map_err(ScreenerError::Listing)?;
        symbols.sort();
        symbols.dedup();

        info!(
            quote = %self.config.quote_asset,
            status = %self.config.symbol_status,
            symbols = symbols.len(),
            "Universe discovered"
        );

        Ok(symbols)
    }

    /// Discover the universe, then screen it.
    pub async fn run(&self) -> Result<ScreenReport, ScreenerError> {
        let universe = self.discover_universe().await?;
        Ok(self.screen(&universe).await)
    }

    /// Screen `universe` (in the given order) against every anchor.
    ///
    /// Never fails as a whole: anchor and target failures are recorded in the
    /// report and processing moves on.
    pub async fn screen(&self, universe: &[String]) -> ScreenReport {
        let assembler = HistoryAssembler::new(
            self.provider,
            self.clock,
            self.config.max_points_per_request,
            self.config.throttle(),
        );
        let mut report = ScreenReport::default();

        info!(
            anchors = self.config.anchors.len(),
            universe = universe.len(),
            interval = %self.config.interval,
            lookback_days = self.config.lookback_days,
            max_lag = self.config.max_lag,
            "Starting lead-lag screen"
        );

        for anchor in &self.config.anchors {
            let anchor_series = match assembler
                .assemble(anchor, self.config.interval, self.config.lookback_days)
                .await
            {
                Ok(series) => series,
                Err(e) => {
                    error!(anchor = %anchor, error = %e, "Anchor history unavailable, skipping anchor");
                    report.failed_anchors.push(AnchorFailure {
                        anchor: anchor.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            info!(anchor = %anchor, points = anchor_series.len(), "Anchor history ready");

            let targets: Vec<&String> = universe.iter().filter(|t| *t != anchor).collect();
            let total = targets.len();

            for (idx, target) in targets.into_iter().enumerate() {
                let outcome = self.screen_target(&assembler, anchor, &anchor_series, target).await;

                info!(
                    anchor = %anchor,
                    target = %target,
                    progress = %format!("{}/{}", idx + 1, total),
                    outcome = %outcome,
                    "Target screened"
                );

                if let TargetOutcome::Qualified(record) = &outcome {
                    report.records.push(record.clone());
                }
                report.attempts.push(TargetAttempt {
                    anchor: anchor.clone(),
                    target: target.clone(),
                    outcome,
                });
            }
        }

        rank_records(&mut report.records);

        info!(
            records = report.records.len(),
            attempts = report.attempts.len(),
            failed_anchors = report.failed_anchors.len(),
            "Screen complete"
        );

        report
    }

    async fn screen_target(
        &self,
        assembler: &HistoryAssembler<'a, P>,
        anchor: &str,
        anchor_series: &PriceSeries,
        target: &str,
    ) -> TargetOutcome {
        let volume = match self.provider.recent_quote_volume(target).await {
            Ok(volume) => volume,
            Err(e) => {
                warn!(target = %target, error = %e, "Volume fetch failed");
                return TargetOutcome::FailedFetch {
                    reason: e.to_string(),
                };
            }
        };

        if volume < self.config.min_liquidity {
            debug!(
                target = %target,
                volume = %volume,
                min = %self.config.min_liquidity,
                "Below liquidity floor"
            );
            return TargetOutcome::SkippedLiquidity { volume };
        }

        let target_series = match assembler
            .assemble(target, self.config.interval, self.config.lookback_days)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(target = %target, error = %e, "Target history unavailable");
                return TargetOutcome::FailedFetch {
                    reason: e.to_string(),
                };
            }
        };

        let pair = AlignedPair::inner_join(anchor_series, &target_series);
        let profile = scan_lags(&pair, self.config.max_lag);
        debug!(
            anchor = %anchor,
            target = %target,
            aligned = pair.len(),
            profile = ?profile,
            "Lag profile"
        );

        let best = select_best(&profile);
        match best.lag {
            Some(lag) if best.correlation.abs() >= self.config.min_abs_correlation => {
                TargetOutcome::Qualified(ScreeningRecord {
                    anchor: anchor.to_string(),
                    target: target.to_string(),
                    lag,
                    correlation: best.correlation,
                    volume,
                })
            }
            lag => TargetOutcome::BelowThreshold {
                lag,
                correlation: best.correlation,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{Interval, PricePoint, ProviderError};
    use crate::types::FixedClock;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn record(target: &str, correlation: f64) -> ScreeningRecord {
        ScreeningRecord {
            anchor: "BTCUSDT".to_string(),
            target: target.to_string(),
            lag: 1,
            correlation,
            volume: dec!(10_000_000),
        }
    }

    #[test]
    fn test_rank_by_absolute_correlation() {
        let mut records = vec![record("A", 0.1), record("B", -0.9), record("C", 0.5)];
        rank_records(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_rank_is_stable_for_equal_magnitude() {
        let mut records = vec![record("A", 0.4), record("B", -0.4), record("C", 0.4)];
        rank_records(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(TargetOutcome::Qualified(record("A", 0.2)).to_string(), "qualified");
        assert_eq!(
            TargetOutcome::SkippedLiquidity { volume: dec!(1) }.label(),
            "skipped_liquidity"
        );
        assert!(!TargetOutcome::FailedFetch { reason: "x".into() }.is_qualified());
    }

    /// Hourly closes per symbol, volumes per symbol, optional failing symbols.
    struct ScriptedFeed {
        origin: DateTime<Utc>,
        closes: HashMap<String, Vec<f64>>,
        volumes: HashMap<String, Decimal>,
        broken: Vec<String>,
        candle_requests: Mutex<Vec<String>>,
    }

    impl ScriptedFeed {
        fn new(origin: DateTime<Utc>) -> Self {
            Self {
                origin,
                closes: HashMap::new(),
                volumes: HashMap::new(),
                broken: Vec::new(),
                candle_requests: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, symbol: &str, volume: Decimal, closes: &[f64]) -> Self {
            self.closes.insert(symbol.to_string(), closes.to_vec());
            self.volumes.insert(symbol.to_string(), volume);
            self
        }

        fn requested(&self, symbol: &str) -> bool {
            self.candle_requests.lock().unwrap().iter().any(|s| s == symbol)
        }
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedFeed {
        async fn list_symbols(&self, _quote: &str, _status: &str) -> Result<Vec<String>, ProviderError> {
            let mut symbols: Vec<String> = self.closes.keys().cloned().collect();
            symbols.sort();
            Ok(symbols)
        }

        async fn get_candles(
            &self,
            symbol: &str,
            _interval: Interval,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PricePoint>, ProviderError> {
            self.candle_requests.lock().unwrap().push(symbol.to_string());
            if self.broken.iter().any(|s| s == symbol) {
                return Err(ProviderError::Http {
                    status: 500,
                    body: "internal".to_string(),
                });
            }
            let closes = self.closes.get(symbol).cloned().unwrap_or_default();
            Ok(closes
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    PricePoint::new(
                        self.origin + Duration::hours(i as i64),
                        Decimal::from_f64_retain(*c).unwrap(),
                    )
                })
                .filter(|p| p.timestamp >= start && p.timestamp <= end)
                .collect())
        }

        async fn recent_quote_volume(&self, symbol: &str) -> Result<Decimal, ProviderError> {
            Ok(self.volumes.get(symbol).copied().unwrap_or(Decimal::ZERO))
        }
    }

    fn config(anchors: &[&str]) -> ScreenerConfig {
        ScreenerConfig {
            anchors: anchors.iter().map(|s| s.to_string()).collect(),
            lookback_days: 1,
            request_throttle_ms: 0,
            min_abs_correlation: 0.5,
            max_lag: 3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_screen_routes_each_target_to_an_outcome() {
        let origin = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let anchor = [100.0, 102.0, 101.0, 104.0, 103.0, 106.0, 104.0, 108.0];
        // follows the anchor one hour later
        let follower = [50.0, 50.0, 51.0, 50.5, 52.0, 51.5, 53.0, 52.0];
        let mut feed = ScriptedFeed::new(origin)
            .with("BTCUSDT", dec!(900_000_000), &anchor)
            .with("FOLLOWUSDT", dec!(20_000_000), &follower)
            .with("THINUSDT", dec!(1_000), &follower)
            .with("BROKENUSDT", dec!(20_000_000), &follower);
        feed.broken.push("BROKENUSDT".to_string());

        let clock = FixedClock(origin + Duration::hours(8));
        let screener = UniverseScreener::new(&feed, &clock, config(&["BTCUSDT"])).unwrap();
        let report = screener.run().await.unwrap();

        // anchor is not screened against itself
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(report.count("qualified"), 1);
        assert_eq!(report.count("skipped_liquidity"), 1);
        assert_eq!(report.count("failed_fetch"), 1);
        assert!(!feed.requested("THINUSDT"));

        let best = &report.records[0];
        assert_eq!(best.target, "FOLLOWUSDT");
        assert_eq!(best.lag, 1);
        assert!(best.correlation > 0.5);
    }

    #[tokio::test]
    async fn test_failed_anchor_does_not_stop_next_anchor() {
        let origin = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let closes = [10.0, 11.0, 10.5, 11.5, 11.0, 12.0];
        let mut feed = ScriptedFeed::new(origin)
            .with("BTCUSDT", dec!(900_000_000), &closes)
            .with("ETHUSDT", dec!(900_000_000), &closes)
            .with("SOLUSDT", dec!(50_000_000), &closes);
        feed.broken.push("BTCUSDT".to_string());

        let clock = FixedClock(origin + Duration::hours(6));
        let screener = UniverseScreener::new(&feed, &clock, config(&["BTCUSDT", "ETHUSDT"])).unwrap();
        let universe = vec!["SOLUSDT".to_string()];
        let report = screener.screen(&universe).await;

        assert_eq!(report.failed_anchors.len(), 1);
        assert_eq!(report.failed_anchors[0].anchor, "BTCUSDT");
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].anchor, "ETHUSDT");
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let feed = ScriptedFeed::new(Utc::now());
        let clock = FixedClock(Utc::now());
        let result = UniverseScreener::new(&feed, &clock, ScreenerConfig::with_anchors(vec![]));
        assert!(matches!(result, Err(ScreenerError::InvalidConfig(_))));
    }

    #[test]
    fn test_lookback_beyond_calendar_rejected_up_front() {
        let feed = ScriptedFeed::new(Utc::now());
        let clock = FixedClock(Utc::now());
        let config = ScreenerConfig {
            lookback_days: 200_000_000,
            ..config(&["BTCUSDT"])
        };
        let result = UniverseScreener::new(&feed, &clock, config);
        assert!(matches!(result, Err(ScreenerError::InvalidConfig(_))));
    }
}
