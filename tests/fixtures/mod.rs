#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use frvp_alerts::config::AppConfig;
use frvp_alerts::market::{Candle, Interval};
use frvp_alerts::volume_profile::ProfileConfig;

/// Create a sample candle around `price`
pub fn create_sample_candle(time: i64, price: f64, volume: f64) -> Candle {
    Candle::new(time, price, price + 1.0, price - 1.0, price + 0.5, volume)
}

/// `count` identical single-price candles
pub fn create_flat_candles(count: usize, price: f64, volume: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| Candle::new(i as i64 * 60_000, price, price, price, price, volume))
        .collect()
}

/// Seeded random-walk candle generator
pub struct CandleGenerator {
    rng: StdRng,
    price: f64,
    time: i64,
}

impl CandleGenerator {
    pub fn new(seed: u64, start_price: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            price: start_price,
            time: 1_700_000_000_000,
        }
    }

    pub fn next_candle(&mut self, interval: Interval) -> Candle {
        let time = self.time;
        self.time += interval.duration_ms();
        let open = self.price;
        let volume = self.rng.random_range(1.0..1000.0);

        // Occasional single-price candle
        if self.rng.random_bool(0.05) {
            return Candle::new(time, open, open, open, open, volume);
        }

        let close = (open * (1.0 + self.rng.random_range(-0.02..0.02))).max(0.01);
        let high = open.max(close) * (1.0 + self.rng.random_range(0.0..0.01));
        let low = open.min(close) * (1.0 - self.rng.random_range(0.0..0.01));
        self.price = close;

        Candle::new(time, open, high, low, close, volume)
    }

    pub fn candles(&mut self, count: usize, interval: Interval) -> Vec<Candle> {
        (0..count).map(|_| self.next_candle(interval)).collect()
    }
}

/// Small-window configuration suited to hand-sized series
pub fn create_test_app_config() -> AppConfig {
    AppConfig {
        profile: ProfileConfig {
            window_size: 20,
            level_count: 10,
            value_area_percent: 70.0,
            ..Default::default()
        },
        ..Default::default()
    }
}
