use tracing::debug;

use crate::market::structs::Candle;

use super::errors::ProfileError;
use super::structs::{ProfileSettings, VolumeProfile};

/// Volume shares of one candle's body and wicks.
///
/// Wicks are weighted at twice their height, so `top_wick` and `bottom_wick`
/// hold double the volume they finally contribute; the halving happens when the
/// wick is credited to a bucket (once to the up tally and once to the down tally).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CandleVolumeSplit {
    pub body: f64,
    pub top_wick: f64,
    pub bottom_wick: f64,
}

impl CandleVolumeSplit {
    pub fn from_candle(candle: &Candle) -> Self {
        let body = candle.body_top() - candle.body_bottom();
        let top_wick = candle.high - candle.body_top();
        let bottom_wick = candle.body_bottom() - candle.low;
        let total_height = body + 2.0 * top_wick + 2.0 * bottom_wick;

        if total_height <= 0.0 {
            return Self::default();
        }

        Self {
            body: candle.volume * body / total_height,
            top_wick: candle.volume * 2.0 * top_wick / total_height,
            bottom_wick: candle.volume * 2.0 * bottom_wick / total_height,
        }
    }
}

/// Length of the intersection of `[a1, a2]` and `[b1, b2]` (endpoints in any order)
pub fn overlap(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a1.max(a2).min(b1.max(b2)) - a1.min(a2).max(b1.min(b2))).max(0.0)
}

/// Volume a sub-range of `height` carrying `volume` puts into `[level_low, level_high]`
fn credited_volume(level_low: f64, level_high: f64, range_a: f64, range_b: f64, height: f64, volume: f64) -> f64 {
    if height == 0.0 {
        return 0.0;
    }
    overlap(level_low, level_high, range_a, range_b) * volume / height
}

/// Compute the fixed-range volume profile of the last `window_size` candles.
///
/// Pure and deterministic. Fails when fewer than `window_size` candles are supplied
/// or when the settings are out of contract; a zero-range window is a valid flat profile.
///
/// A single-price candle inside a ranged window is credited whole to the bucket holding
/// its price rather than dropped, so bucket volumes always sum to the window volume.
pub fn compute(candles: &[Candle], settings: &ProfileSettings) -> Result<VolumeProfile, ProfileError> {
    settings.validate()?;

    if candles.len() < settings.window_size {
        return Err(ProfileError::InsufficientData {
            required: settings.window_size,
            available: candles.len(),
        });
    }

    let window = &candles[candles.len() - settings.window_size..];
    let level_count = settings.level_count;

    let (bot, top) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), c| {
            (low.min(c.low), high.max(c.high))
        });
    let step = (top - bot) / level_count as f64;

    let mut levels: Vec<f64> = (0..=level_count).map(|x| bot + step * x as f64).collect();
    levels[level_count] = top;

    let mut up_volume = vec![0.0; level_count];
    let mut down_volume = vec![0.0; level_count];

    if step > 0.0 {
        for candle in window {
            accumulate_candle(candle, &levels, step, &mut up_volume, &mut down_volume);
        }
    } else {
        // Zero-range window: every candle sits on the same price, bucket 0 holds it all
        let window_volume: f64 = window.iter().map(|c| c.volume).sum();
        up_volume[0] = window_volume / 2.0;
        down_volume[0] = window_volume / 2.0;
    }

    let volume_by_level: Vec<f64> = up_volume
        .iter()
        .zip(&down_volume)
        .map(|(up, down)| up + down)
        .collect();
    let total_volume: f64 = window.iter().map(|c| c.volume).sum();

    let poc_index = find_poc(&volume_by_level);
    let (val_index, vah_index) = expand_value_area(&volume_by_level, poc_index, settings.value_area_percent);

    let midpoint = |index: usize| (levels[index] + levels[index + 1]) / 2.0;
    let profile = VolumeProfile {
        poc: midpoint(poc_index),
        vah: midpoint(vah_index),
        val: midpoint(val_index),
        poc_index,
        vah_index,
        val_index,
        step,
        total_volume,
        value_area_percent: settings.value_area_percent,
        candle_count: window.len(),
        window_start: window[0].time,
        window_end: window[window.len() - 1].time,
        levels,
        volume_by_level,
        up_volume,
        down_volume,
    };

    debug!(
        "FRVP computed over {} candles [{:.4}, {:.4}]: POC={:.4} VAH={:.4} VAL={:.4} ({:.1}% in value area)",
        profile.candle_count,
        bot,
        top,
        profile.poc,
        profile.vah,
        profile.val,
        profile.value_area_coverage()
    );

    Ok(profile)
}

/// Spread one candle's body and wick volume across the buckets it overlaps
fn accumulate_candle(candle: &Candle, levels: &[f64], step: f64, up_volume: &mut [f64], down_volume: &mut [f64]) {
    let body_top = candle.body_top();
    let body_bottom = candle.body_bottom();
    let body_height = body_top - body_bottom;
    let top_wick_height = candle.high - body_top;
    let bottom_wick_height = body_bottom - candle.low;

    if body_height + top_wick_height + bottom_wick_height <= 0.0 {
        // Single-price candle: no height to split over, so its volume lands in the bucket
        // holding that price, split evenly like a wick
        let bucket = (((candle.close - levels[0]) / step).floor().max(0.0) as usize).min(up_volume.len() - 1);
        up_volume[bucket] += candle.volume / 2.0;
        down_volume[bucket] += candle.volume / 2.0;
        return;
    }

    let split = CandleVolumeSplit::from_candle(candle);
    let bullish = candle.is_bullish();

    for x in 0..up_volume.len() {
        let (level_low, level_high) = (levels[x], levels[x + 1]);

        let body = credited_volume(level_low, level_high, body_bottom, body_top, body_height, split.body);
        let top_wick = credited_volume(level_low, level_high, body_top, candle.high, top_wick_height, split.top_wick) / 2.0;
        let bottom_wick =
            credited_volume(level_low, level_high, body_bottom, candle.low, bottom_wick_height, split.bottom_wick) / 2.0;

        if bullish {
            up_volume[x] += body;
        } else {
            down_volume[x] += body;
        }
        up_volume[x] += top_wick + bottom_wick;
        down_volume[x] += top_wick + bottom_wick;
    }
}

/// Index of the first bucket holding the maximum volume
fn find_poc(volume_by_level: &[f64]) -> usize {
    let mut poc = 0;
    let mut max_volume = volume_by_level[0];
    for (index, &volume) in volume_by_level.iter().enumerate().skip(1) {
        if volume > max_volume {
            max_volume = volume;
            poc = index;
        }
    }
    poc
}

/// Grow the value area from the POC one bucket at a time toward the heavier neighbour
/// (ties go up) until the target share is covered or both neighbours are empty.
/// Returns `(val_index, vah_index)`.
fn expand_value_area(volume_by_level: &[f64], poc_index: usize, value_area_percent: f64) -> (usize, usize) {
    let target: f64 = volume_by_level.iter().sum::<f64>() * value_area_percent / 100.0;
    let mut covered = volume_by_level[poc_index];
    let mut low = poc_index;
    let mut high = poc_index;

    while covered < target {
        let upper = if high + 1 < volume_by_level.len() { volume_by_level[high + 1] } else { 0.0 };
        let lower = if low > 0 { volume_by_level[low - 1] } else { 0.0 };

        if upper == 0.0 && lower == 0.0 {
            break;
        }

        if upper >= lower {
            covered += upper;
            high += 1;
        } else {
            covered += lower;
            low -= 1;
        }
    }

    (low, high)
}
