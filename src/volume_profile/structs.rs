use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::common::constants::{
    DEFAULT_LEVEL_COUNT, DEFAULT_VALUE_AREA_PERCENT, DEFAULT_WINDOW_SIZE, RECOMMENDED_LEVEL_COUNT,
    RECOMMENDED_VALUE_AREA_PERCENT, RECOMMENDED_WINDOW_SIZE,
};
use crate::market::structs::{Interval, TimestampMS};

use super::errors::ProfileError;

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_level_count() -> usize {
    DEFAULT_LEVEL_COUNT
}

fn default_value_area_percent() -> f64 {
    DEFAULT_VALUE_AREA_PERCENT
}

/// Parameters of a single FRVP calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Number of most recent candles in the fixed range
    pub window_size: usize,
    /// Number of price buckets between the window low and high
    pub level_count: usize,
    /// Share of total volume the value area must reach, in percent
    pub value_area_percent: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            level_count: DEFAULT_LEVEL_COUNT,
            value_area_percent: DEFAULT_VALUE_AREA_PERCENT,
        }
    }
}

impl ProfileSettings {
    pub fn new(window_size: usize, level_count: usize, value_area_percent: f64) -> Self {
        Self {
            window_size,
            level_count,
            value_area_percent,
        }
    }

    /// Hard contract checks; violating any of these makes the calculation meaningless
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.window_size == 0 {
            return Err(ProfileError::InvalidSettings("window_size must be at least 1".to_string()));
        }

        if self.level_count == 0 {
            return Err(ProfileError::InvalidSettings("level_count must be at least 1".to_string()));
        }

        if !(self.value_area_percent > 0.0 && self.value_area_percent <= 100.0) {
            return Err(ProfileError::InvalidSettings(format!(
                "value_area_percent must be in (0, 100], got {}",
                self.value_area_percent
            )));
        }

        Ok(())
    }

    /// Log values outside the recommended operating ranges
    pub fn warn_if_unusual(&self, context: &str) {
        let (min_window, max_window) = RECOMMENDED_WINDOW_SIZE;
        if !(min_window..=max_window).contains(&self.window_size) {
            warn!(
                "{}: window_size {} is outside the recommended range {}-{}",
                context, self.window_size, min_window, max_window
            );
        }

        let (min_levels, max_levels) = RECOMMENDED_LEVEL_COUNT;
        if !(min_levels..=max_levels).contains(&self.level_count) {
            warn!(
                "{}: level_count {} is outside the recommended range {}-{}",
                context, self.level_count, min_levels, max_levels
            );
        }

        let (min_va, max_va) = RECOMMENDED_VALUE_AREA_PERCENT;
        if !(min_va..=max_va).contains(&self.value_area_percent) {
            warn!(
                "{}: value_area_percent {} is outside the recommended range {}-{}",
                context, self.value_area_percent, min_va, max_va
            );
        }
    }
}

/// Per-interval overrides of the profile parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_area_percent: Option<f64>,
}

/// Volume profile configuration (`[profile]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_level_count")]
    pub level_count: usize,
    #[serde(default = "default_value_area_percent")]
    pub value_area_percent: f64,
    /// Overrides keyed by interval notation ("1h", "4h", ...)
    #[serde(default)]
    pub interval_overrides: HashMap<String, IntervalOverride>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            level_count: DEFAULT_LEVEL_COUNT,
            value_area_percent: DEFAULT_VALUE_AREA_PERCENT,
            interval_overrides: HashMap::new(),
        }
    }
}

impl ProfileConfig {
    /// Resolve the settings for one interval, applying its override if present
    pub fn resolve_for_interval(&self, interval: Interval) -> ProfileSettings {
        let interval_override = self.interval_overrides.get(interval.as_str());

        ProfileSettings {
            window_size: interval_override
                .and_then(|o| o.window_size)
                .unwrap_or(self.window_size),
            level_count: interval_override
                .and_then(|o| o.level_count)
                .unwrap_or(self.level_count),
            value_area_percent: interval_override
                .and_then(|o| o.value_area_percent)
                .unwrap_or(self.value_area_percent),
        }
    }

    /// Validate global settings and every override
    pub fn validate(&self) -> Result<(), String> {
        ProfileSettings::new(self.window_size, self.level_count, self.value_area_percent)
            .validate()
            .map_err(|e| e.to_string())?;

        for key in self.interval_overrides.keys() {
            let interval: Interval = key.parse()?;
            self.resolve_for_interval(interval)
                .validate()
                .map_err(|e| format!("Interval {}: {}", key, e))?;
        }

        Ok(())
    }
}

/// Fixed-range volume profile over one window of candles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// `level_count + 1` bucket boundaries from the window low to the window high
    pub levels: Vec<f64>,
    /// Volume per bucket (`up_volume + down_volume`)
    pub volume_by_level: Vec<f64>,
    /// Bullish body volume plus half of the wick volume, per bucket
    pub up_volume: Vec<f64>,
    /// Bearish body volume plus half of the wick volume, per bucket
    pub down_volume: Vec<f64>,
    /// Point of Control
    pub poc: f64,
    /// Value Area High
    pub vah: f64,
    /// Value Area Low
    pub val: f64,
    pub poc_index: usize,
    pub vah_index: usize,
    pub val_index: usize,
    /// Bucket height (0 for a zero-range window)
    pub step: f64,
    /// Sum of the windowed candle volumes
    pub total_volume: f64,
    /// Value area target this profile was computed with, in percent
    pub value_area_percent: f64,
    pub candle_count: usize,
    pub window_start: TimestampMS,
    pub window_end: TimestampMS,
}

impl VolumeProfile {
    /// Window low
    pub fn range_low(&self) -> f64 {
        self.levels.first().copied().unwrap_or(0.0)
    }

    /// Window high
    pub fn range_high(&self) -> f64 {
        self.levels.last().copied().unwrap_or(0.0)
    }

    /// True for a zero-range window
    pub fn is_flat(&self) -> bool {
        self.step == 0.0
    }

    /// Volume inside `[val_index, vah_index]`
    pub fn value_area_volume(&self) -> f64 {
        self.volume_by_level
            .get(self.val_index..=self.vah_index)
            .map(|buckets| buckets.iter().sum())
            .unwrap_or(0.0)
    }

    /// Share of total volume actually covered by the value area, in percent
    pub fn value_area_coverage(&self) -> f64 {
        if self.total_volume <= 0.0 {
            return 0.0;
        }
        self.value_area_volume() / self.total_volume * 100.0
    }

    /// `val <= price <= vah`
    pub fn is_inside_value_area(&self, price: f64) -> bool {
        price >= self.val && price <= self.vah
    }
}
