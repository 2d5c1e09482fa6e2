use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::DEFAULT_POC_TOUCH_THRESHOLD_PERCENT;
use crate::market::structs::Interval;
use crate::volume_profile::structs::VolumeProfile;

fn default_true() -> bool {
    true
}

fn default_poc_threshold() -> f64 {
    DEFAULT_POC_TOUCH_THRESHOLD_PERCENT
}

/// Identity of one tracked price series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceKey {
    pub symbol: String,
    pub interval: Interval,
    /// Independent observers of the same symbol/interval keep separate state
    pub subscriber: Option<String>,
}

impl PriceKey {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            subscriber: None,
        }
    }

    pub fn for_subscriber(mut self, subscriber: impl Into<String>) -> Self {
        self.subscriber = Some(subscriber.into());
        self
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subscriber {
            Some(subscriber) => write!(f, "{}_{}@{}", self.symbol, self.interval, subscriber),
            None => write!(f, "{}_{}", self.symbol, self.interval),
        }
    }
}

/// Last observation for a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub price: f64,
    /// Profile the price was classified against
    pub profile: VolumeProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Level transition with the level values it was detected against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlertKind {
    PocTouch { poc: f64 },
    VahBreakout { vah: f64 },
    ValBreakdown { val: f64 },
    EnteredValueArea { val: f64, vah: f64 },
    LeftValueArea { direction: Direction, val: f64, vah: f64 },
}

impl AlertKind {
    /// Config-style name of the alert type
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::PocTouch { .. } => "poc_touch",
            AlertKind::VahBreakout { .. } => "vah_breakout",
            AlertKind::ValBreakdown { .. } => "val_breakdown",
            AlertKind::EnteredValueArea { .. } => "entered_value_area",
            AlertKind::LeftValueArea { .. } => "left_value_area",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub symbol: String,
    pub interval: Interval,
    /// Price that triggered the alert
    pub price: f64,
    pub previous_price: f64,
    pub kind: AlertKind,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: ", self.symbol, self.interval, self.kind.name())?;
        match self.kind {
            AlertKind::PocTouch { poc } => write!(f, "price {} touched POC {}", self.price, poc),
            AlertKind::VahBreakout { vah } => write!(f, "price {} broke above VAH {}", self.price, vah),
            AlertKind::ValBreakdown { val } => write!(f, "price {} broke below VAL {}", self.price, val),
            AlertKind::EnteredValueArea { val, vah } => {
                write!(f, "price {} entered value area {} - {}", self.price, val, vah)
            }
            AlertKind::LeftValueArea { direction, val, vah } => write!(
                f,
                "price {} left value area {} - {} heading {}",
                self.price, val, vah, direction
            ),
        }
    }
}

/// On/off switch for one alert type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AlertToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PocTouchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Distance to POC, in percent of POC, that counts as a touch
    #[serde(default = "default_poc_threshold")]
    pub threshold_percent: f64,
}

impl Default for PocTouchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_percent: DEFAULT_POC_TOUCH_THRESHOLD_PERCENT,
        }
    }
}

/// Alert configuration (`[alerts]` section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Master switch; when off, prices are still tracked but nothing fires
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub poc_touch: PocTouchConfig,
    #[serde(default)]
    pub vah_breakout: AlertToggle,
    #[serde(default)]
    pub val_breakdown: AlertToggle,
    #[serde(default)]
    pub entered_value_area: AlertToggle,
    #[serde(default)]
    pub left_value_area: AlertToggle,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poc_touch: PocTouchConfig::default(),
            vah_breakout: AlertToggle::default(),
            val_breakdown: AlertToggle::default(),
            entered_value_area: AlertToggle::default(),
            left_value_area: AlertToggle::default(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<(), String> {
        let threshold = self.poc_touch.threshold_percent;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(format!(
                "poc_touch.threshold_percent must be positive, got {}",
                threshold
            ));
        }
        Ok(())
    }
}
