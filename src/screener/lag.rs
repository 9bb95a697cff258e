//! Lagged return correlation
//!
//! Aligns two close series on timestamp, converts both to simple returns and
//! scans a lag window for the offset with the strongest linear relationship
//! between the anchor's move and the target's later move.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;

use crate::types::PriceSeries;

/// Minimum overlapping observations for a correlation to be defined
const MIN_OVERLAP: usize = 2;

/// Simple returns aligned index-for-index with their close series.
///
/// Element 0 is always undefined. Element i is undefined when close[i-1] is
/// zero or the result is not finite.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    values: Vec<Option<f64>>,
}

impl ReturnSeries {
    pub fn from_closes(closes: &[f64]) -> Self {
        let values = (0..closes.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let prev = closes[i - 1];
                if prev == 0.0 {
                    return None;
                }
                let r = (closes[i] - prev) / prev;
                r.is_finite().then_some(r)
            })
            .collect();

        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied().flatten()
    }

    /// Number of defined elements
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Anchor and target closes restricted to their common timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    timestamps: Vec<DateTime<Utc>>,
    anchor: Vec<f64>,
    target: Vec<f64>,
}

impl AlignedPair {
    /// Inner join on timestamp. Both inputs are sorted and unique, so a
    /// single merge pass suffices.
    pub fn inner_join(anchor: &PriceSeries, target: &PriceSeries) -> Self {
        let a = anchor.points();
        let t = target.points();
        let capacity = a.len().min(t.len());

        let mut timestamps = Vec::with_capacity(capacity);
        let mut anchor_closes = Vec::with_capacity(capacity);
        let mut target_closes = Vec::with_capacity(capacity);

        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < t.len() {
            match a[i].timestamp.cmp(&t[j].timestamp) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    timestamps.push(a[i].timestamp);
                    anchor_closes.push(a[i].close.to_f64().unwrap_or(f64::NAN));
                    target_closes.push(t[j].close.to_f64().unwrap_or(f64::NAN));
                    i += 1;
                    j += 1;
                }
            }
        }

        Self {
            timestamps,
            anchor: anchor_closes,
            target: target_closes,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn anchor_returns(&self) -> ReturnSeries {
        ReturnSeries::from_closes(&self.anchor)
    }

    pub fn target_returns(&self) -> ReturnSeries {
        ReturnSeries::from_closes(&self.target)
    }
}

/// Best lag found for an (anchor, target) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagResult {
    /// Offset in periods; `None` when no lag produced a defined correlation
    pub lag: Option<usize>,
    /// Correlation at `lag`, 0.0 when `lag` is `None`
    pub correlation: f64,
}

impl LagResult {
    pub fn none() -> Self {
        Self {
            lag: None,
            correlation: 0.0,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.lag.is_some()
    }
}

/// Calculate Pearson correlation coefficient between two sequences
///
/// Returns a value in [-1.0, 1.0], or None if the correlation is undefined:
/// mismatched lengths, fewer than two points, or zero variance in either leg.
///
/// # Mathematical Definition
/// r = Σ[(xi - x̄)(yi - ȳ)] / √[Σ(xi - x̄)² × Σ(yi - ȳ)²]
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < MIN_OVERLAP {
        return None;
    }

    // Exact constancy check; the mean of identical floats is not always identical
    if a.iter().all(|x| *x == a[0]) || b.iter().all(|y| *y == b[0]) {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }

    let correlation = covariance / (var_a.sqrt() * var_b.sqrt());

    if correlation.is_finite() {
        Some(correlation.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Correlation of anchor return i with target return i + `lag`, over the
/// indices where both are defined.
pub fn lagged_correlation(anchor: &ReturnSeries, target: &ReturnSeries, lag: usize) -> Option<f64> {
    let n = anchor.len().min(target.len());
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);

    for i in 0..n.saturating_sub(lag) {
        if let (Some(x), Some(y)) = (anchor.get(i), target.get(i + lag)) {
            xs.push(x);
            ys.push(y);
        }
    }

    pearson_correlation(&xs, &ys)
}

/// Correlation for every lag in `1..=max_lag`, in ascending lag order.
pub fn scan_lags(pair: &AlignedPair, max_lag: usize) -> Vec<(usize, Option<f64>)> {
    let anchor = pair.anchor_returns();
    let target = pair.target_returns();

    (1..=max_lag)
        .map(|lag| (lag, lagged_correlation(&anchor, &target, lag)))
        .collect()
}

/// Pick the lag with the largest absolute correlation.
///
/// Undefined lags are skipped. Ties keep the smaller lag because the scan is
/// ascending and only a strictly larger magnitude replaces the current best.
pub fn select_best(profile: &[(usize, Option<f64>)]) -> LagResult {
    let mut best = LagResult::none();

    for &(lag, correlation) in profile {
        let Some(correlation) = correlation else {
            continue;
        };
        if !best.is_defined() || correlation.abs() > best.correlation.abs() {
            best = LagResult {
                lag: Some(lag),
                correlation,
            };
        }
    }

    best
}

/// Best lag for an already aligned pair
pub fn best_lag_aligned(pair: &AlignedPair, max_lag: usize) -> LagResult {
    select_best(&scan_lags(pair, max_lag))
}

/// Align `anchor` and `target` and search lags `1..=max_lag`.
pub fn best_lag(anchor: &PriceSeries, target: &PriceSeries, max_lag: usize) -> LagResult {
    best_lag_aligned(&AlignedPair::inner_join(anchor, target), max_lag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Interval, PricePoint};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn hourly(symbol: &str, closes: &[f64]) -> PriceSeries {
        hourly_from(symbol, 0, closes)
    }

    fn hourly_from(symbol: &str, first_hour: i64, closes: &[f64]) -> PriceSeries {
        let origin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                PricePoint::new(
                    origin + Duration::hours(first_hour + i as i64),
                    Decimal::from_f64_retain(*c).unwrap(),
                )
            })
            .collect();
        PriceSeries::from_points(symbol, Interval::OneHour, points)
    }

    /// Closes whose returns are `returns`, starting from `base`
    fn closes_from_returns(base: f64, returns: &[f64]) -> Vec<f64> {
        let mut closes = vec![base];
        for r in returns {
            let last = *closes.last().unwrap();
            closes.push(last * (1.0 + r));
        }
        closes
    }

    #[test]
    fn test_correlation_perfect() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let corr = pearson_correlation(&a, &b).unwrap();
        assert!((corr - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_correlation_negative() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![5.0, 4.0, 3.0, 2.0, 1.0];
        let corr = pearson_correlation(&a, &b).unwrap();
        assert!((corr + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_correlation_zero_variance_is_undefined() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![0.1, 0.1, 0.1];
        assert_eq!(pearson_correlation(&a, &b), None);
        assert_eq!(pearson_correlation(&b, &a), None);
    }

    #[test]
    fn test_correlation_needs_two_points() {
        assert_eq!(pearson_correlation(&[1.0], &[2.0]), None);
        assert_eq!(pearson_correlation(&[], &[]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_returns_skip_first_element() {
        let returns = ReturnSeries::from_closes(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 3);
        assert_eq!(returns.get(0), None);
        assert!((returns.get(1).unwrap() - 0.1).abs() < 1e-12);
        assert!((returns.get(2).unwrap() + 0.1).abs() < 1e-12);
        assert_eq!(returns.defined_count(), 2);
    }

    #[test]
    fn test_return_after_zero_close_is_undefined() {
        let returns = ReturnSeries::from_closes(&[0.0, 1.0, 2.0]);
        assert_eq!(returns.get(1), None);
        assert_eq!(returns.get(2), Some(1.0));
    }

    #[test]
    fn test_inner_join_keeps_common_timestamps() {
        let anchor = hourly("BTCUSDT", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let target = hourly_from("ETHUSDT", 2, &[30.0, 40.0, 50.0, 60.0]);

        let pair = AlignedPair::inner_join(&anchor, &target);

        assert_eq!(pair.len(), 3);
        assert_eq!(pair.timestamps()[0], anchor.points()[2].timestamp);
        assert_eq!(pair.anchor, vec![3.0, 4.0, 5.0]);
        assert_eq!(pair.target, vec![30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_disjoint_series_yield_no_result() {
        let anchor = hourly("BTCUSDT", &[1.0, 2.0, 3.0]);
        let target = hourly_from("ETHUSDT", 10, &[1.0, 2.0, 3.0]);
        assert_eq!(best_lag(&anchor, &target, 12), LagResult::none());
    }

    #[test]
    fn test_target_lagging_two_periods() {
        let anchor_closes = [100.0, 101.0, 102.5, 101.0, 103.0];
        let anchor_returns: Vec<f64> = anchor_closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        // target return at i + 2 equals anchor return at i
        let target_closes = closes_from_returns(
            50.0,
            &[0.005, -0.02, anchor_returns[0], anchor_returns[1]],
        );

        let anchor = hourly("BTCUSDT", &anchor_closes);
        let target = hourly("LUMIAUSDT", &target_closes);

        let result = best_lag(&anchor, &target, 12);
        assert_eq!(result.lag, Some(2));
        assert!((result.correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovers_longer_lag() {
        let returns: Vec<f64> = (0..200)
            .map(|i| ((i as f64) * 0.7).sin() * 0.01 + ((i as f64) * 1.9).cos() * 0.004)
            .collect();
        let anchor_closes = closes_from_returns(100.0, &returns);
        let mut lagged = vec![0.001, -0.002, 0.003];
        lagged.extend_from_slice(&returns[..returns.len() - 3]);
        let target_closes = closes_from_returns(10.0, &lagged);

        let result = best_lag(
            &hourly("ETHUSDT", &anchor_closes),
            &hourly("SOLUSDT", &target_closes),
            12,
        );
        assert_eq!(result.lag, Some(3));
        assert!(result.correlation > 0.999);
    }

    #[test]
    fn test_constant_target_has_no_result() {
        let anchor = hourly("BTCUSDT", &[100.0, 101.0, 99.0, 102.0, 98.0, 103.0]);
        let target = hourly("STABLEUSDT", &[1.0; 6]);

        let profile = scan_lags(&AlignedPair::inner_join(&anchor, &target), 4);
        assert!(profile.iter().all(|(_, c)| c.is_none()));

        let result = best_lag(&anchor, &target, 4);
        assert_eq!(result.lag, None);
        assert_eq!(result.correlation, 0.0);
    }

    #[test]
    fn test_tie_prefers_smaller_lag() {
        let profile = vec![(1, Some(0.2)), (2, Some(-0.6)), (3, Some(0.6)), (4, None)];
        let best = select_best(&profile);
        assert_eq!(best.lag, Some(2));
        assert_eq!(best.correlation, -0.6);
    }

    #[test]
    fn test_select_best_skips_undefined() {
        let profile = vec![(1, None), (2, Some(0.1)), (3, None)];
        assert_eq!(select_best(&profile).lag, Some(2));
        assert_eq!(select_best(&[(1, None), (2, None)]), LagResult::none());
    }

    #[test]
    fn test_scan_covers_each_lag_once() {
        let anchor = hourly("BTCUSDT", &[100.0, 101.0, 99.0, 102.0, 98.0, 103.0]);
        let target = hourly("ETHUSDT", &[10.0, 10.2, 10.1, 9.9, 10.4, 10.3]);
        let profile = scan_lags(&AlignedPair::inner_join(&anchor, &target), 12);

        let lags: Vec<usize> = profile.iter().map(|(l, _)| *l).collect();
        assert_eq!(lags, (1..=12).collect::<Vec<_>>());
        // only 5 defined returns, so lags past 3 have fewer than 2 overlapping points
        assert!(profile[..3].iter().all(|(_, c)| c.is_some()));
        assert!(profile[3..].iter().all(|(_, c)| c.is_none()));
    }
}
