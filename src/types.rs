//! Common Types Module
//!
//! Shared types used across the codebase to avoid circular dependencies.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval (maps 1:1 to exchange kline interval strings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinute,
    #[serde(rename = "5m")]
    FiveMinute,
    #[serde(rename = "15m")]
    FifteenMinute,
    #[serde(rename = "30m")]
    ThirtyMinute,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHour,
    #[serde(rename = "4h")]
    FourHour,
    #[serde(rename = "6h")]
    SixHour,
    #[serde(rename = "8h")]
    EightHour,
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    /// Wire representation (e.g. "1h")
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::ThreeMinute => "3m",
            Interval::FiveMinute => "5m",
            Interval::FifteenMinute => "15m",
            Interval::ThirtyMinute => "30m",
            Interval::OneHour => "1h",
            Interval::TwoHour => "2h",
            Interval::FourHour => "4h",
            Interval::SixHour => "6h",
            Interval::EightHour => "8h",
            Interval::TwelveHour => "12h",
            Interval::OneDay => "1d",
            Interval::ThreeDay => "3d",
            Interval::OneWeek => "1w",
        }
    }

    /// Length of one candle in minutes
    pub fn minutes(&self) -> i64 {
        match self {
            Interval::OneMinute => 1,
            Interval::ThreeMinute => 3,
            Interval::FiveMinute => 5,
            Interval::FifteenMinute => 15,
            Interval::ThirtyMinute => 30,
            Interval::OneHour => 60,
            Interval::TwoHour => 120,
            Interval::FourHour => 240,
            Interval::SixHour => 360,
            Interval::EightHour => 480,
            Interval::TwelveHour => 720,
            Interval::OneDay => 1_440,
            Interval::ThreeDay => 4_320,
            Interval::OneWeek => 10_080,
        }
    }

    /// Length of one candle
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let interval = match s.trim() {
            "1m" => Interval::OneMinute,
            "3m" => Interval::ThreeMinute,
            "5m" => Interval::FiveMinute,
            "15m" => Interval::FifteenMinute,
            "30m" => Interval::ThirtyMinute,
            "1h" | "1H" => Interval::OneHour,
            "2h" | "2H" => Interval::TwoHour,
            "4h" | "4H" => Interval::FourHour,
            "6h" | "6H" => Interval::SixHour,
            "8h" | "8H" => Interval::EightHour,
            "12h" | "12H" => Interval::TwelveHour,
            "1d" | "1D" => Interval::OneDay,
            "3d" | "3D" => Interval::ThreeDay,
            "1w" | "1W" => Interval::OneWeek,
            _ => {
                return Err(format!(
                    "Unknown interval: '{}'. Valid options: 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 1d, 3d, 1w",
                    s
                ))
            }
        };
        Ok(interval)
    }
}

/// A single close observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    /// Close price
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self { timestamp, close }
    }
}

/// Time-ordered close series for one symbol and interval.
///
/// Timestamps are strictly increasing and unique. The series cannot be
/// mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeries {
    symbol: String,
    interval: Interval,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw points in any order.
    ///
    /// Points are sorted ascending by timestamp; when a timestamp repeats,
    /// the first occurrence in `points` is kept.
    pub fn from_points(symbol: impl Into<String>, interval: Interval, mut points: Vec<PricePoint>) -> Self {
        // sort_by_key is stable, so the first occurrence stays in front of its duplicates
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);

        Self {
            symbol: symbol.into(),
            interval,
            points,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }
}

/// Source of "now", injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
