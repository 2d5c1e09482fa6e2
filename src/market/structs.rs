use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TimestampMS = i64;

/// OHLCV candle as consumed by the volume profile calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds
    pub time: TimestampMS,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: TimestampMS, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn open_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }

    /// True when the candle closed at or above its open
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// `low <= min(open, close) <= max(open, close) <= high` with a non-negative volume
    pub fn is_consistent(&self) -> bool {
        self.low <= self.body_bottom()
            && self.body_top() <= self.high
            && self.volume >= 0.0
            && [self.open, self.high, self.low, self.close, self.volume]
                .iter()
                .all(|v| v.is_finite())
    }
}

/// Candle intervals supported by the candle source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
        Interval::OneWeek,
    ];

    /// Exchange notation, also used as the config key
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1w",
        }
    }

    pub fn duration_ms(&self) -> TimestampMS {
        const MINUTE: TimestampMS = 60_000;
        match self {
            Interval::OneMinute => MINUTE,
            Interval::FiveMinutes => 5 * MINUTE,
            Interval::FifteenMinutes => 15 * MINUTE,
            Interval::ThirtyMinutes => 30 * MINUTE,
            Interval::OneHour => 60 * MINUTE,
            Interval::FourHours => 240 * MINUTE,
            Interval::OneDay => 1_440 * MINUTE,
            Interval::OneWeek => 10_080 * MINUTE,
        }
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
        Interval::ALL
            .iter()
            .copied()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid interval: {}. Valid options: 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w",
                    s
                )
            })
    }
}
