use tracing::debug;

use crate::volume_profile::position::percent_distance;
use crate::volume_profile::structs::VolumeProfile;

use super::store::PriceStateStore;
use super::structs::{AlertConfig, AlertEvent, AlertKind, Direction, PriceKey, PriceState};

/// Classify the move from `previous_price` to `current_price` against one profile.
///
/// Both prices are judged against the levels of the given (current) profile. Each
/// rule is checked independently, so one transition can produce several events.
/// Without a previous price there is no transition and nothing fires.
pub fn classify(
    key: &PriceKey,
    previous_price: Option<f64>,
    current_price: f64,
    profile: &VolumeProfile,
    config: &AlertConfig,
) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    let previous = match previous_price {
        Some(previous) if config.enabled => previous,
        _ => return events,
    };

    let (poc, vah, val) = (profile.poc, profile.vah, profile.val);
    let mut emit = |kind: AlertKind| {
        events.push(AlertEvent {
            symbol: key.symbol.clone(),
            interval: key.interval,
            price: current_price,
            previous_price: previous,
            kind,
        })
    };

    // Rising edge into the POC band; a non-positive POC has no meaningful band
    if config.poc_touch.enabled && poc > 0.0 {
        let threshold = config.poc_touch.threshold_percent;
        let current_distance = percent_distance(current_price, poc).abs();
        let previous_distance = percent_distance(previous, poc).abs();
        if current_distance < threshold && previous_distance >= threshold {
            emit(AlertKind::PocTouch { poc });
        }
    }

    if config.vah_breakout.enabled && previous <= vah && current_price > vah {
        emit(AlertKind::VahBreakout { vah });
    }

    if config.val_breakdown.enabled && previous >= val && current_price < val {
        emit(AlertKind::ValBreakdown { val });
    }

    let was_inside = profile.is_inside_value_area(previous);
    let is_inside = profile.is_inside_value_area(current_price);

    if config.entered_value_area.enabled && !was_inside && is_inside {
        emit(AlertKind::EnteredValueArea { val, vah });
    }

    if config.left_value_area.enabled && was_inside && !is_inside {
        let direction = if current_price > vah {
            Direction::Up
        } else {
            Direction::Down
        };
        emit(AlertKind::LeftValueArea { direction, val, vah });
    }

    events
}

/// Stateful wrapper around [`classify`] that remembers the last price per key
#[derive(Debug)]
pub struct LevelCrossingDetector {
    config: AlertConfig,
    store: PriceStateStore,
}

impl LevelCrossingDetector {
    pub fn new(config: AlertConfig, store: PriceStateStore) -> Self {
        Self { config, store }
    }

    /// Classify against the stored previous price, then store `current_price`.
    ///
    /// The first observation for a key only seeds state.
    pub fn observe(
        &mut self,
        key: &PriceKey,
        current_price: f64,
        profile: &VolumeProfile,
    ) -> Vec<AlertEvent> {
        let previous_price = self.store.previous_price(key);
        let events = classify(key, previous_price, current_price, profile, &self.config);

        if previous_price.is_none() {
            debug!("🌱 Seeded price state for {} at {}", key, current_price);
        }

        self.store.insert(
            key.clone(),
            PriceState {
                price: current_price,
                profile: profile.clone(),
            },
        );

        events
    }

    /// Forget a key; the next observation for it is a cold start again
    pub fn evict(&mut self, key: &PriceKey) -> bool {
        self.store.remove(key).is_some()
    }

    pub fn state(&self, key: &PriceKey) -> Option<&PriceState> {
        self.store.get(key)
    }

    pub fn store(&self) -> &PriceStateStore {
        &self.store
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::structs::Interval;

    /// Profile with hand-placed levels; only poc/val/vah matter to the detector
    fn create_test_profile(val: f64, poc: f64, vah: f64) -> VolumeProfile {
        VolumeProfile {
            levels: vec![val, vah],
            volume_by_level: vec![100.0],
            up_volume: vec![50.0],
            down_volume: vec![50.0],
            poc,
            vah,
            val,
            poc_index: 0,
            vah_index: 0,
            val_index: 0,
            step: vah - val,
            total_volume: 100.0,
            value_area_percent: 70.0,
            candle_count: 1,
            window_start: 0,
            window_end: 0,
        }
    }

    fn create_test_key() -> PriceKey {
        PriceKey::new("BTCUSDT", Interval::OneHour)
    }

    fn kinds(events: &[AlertEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind.name()).collect()
    }

    #[test]
    fn test_cold_start_is_silent() {
        let profile = create_test_profile(95.0, 100.0, 105.0);
        let config = AlertConfig::default();

        for price in [0.0, 50.0, 100.0, 200.0] {
            assert!(classify(&create_test_key(), None, price, &profile, &config).is_empty());
        }
    }

    #[test]
    fn test_breakout_from_below_value_area_is_the_only_event() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let events = classify(
            &create_test_key(),
            Some(99.0),
            101.0,
            &profile,
            &AlertConfig::default(),
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::VahBreakout { vah: 100.0 });
        assert_eq!(events[0].price, 101.0);
        assert_eq!(events[0].previous_price, 99.0);
        assert_eq!(events[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_breakout_from_inside_also_leaves_value_area() {
        let profile = create_test_profile(95.0, 97.0, 100.0);
        let events = classify(
            &create_test_key(),
            Some(99.0),
            101.0,
            &profile,
            &AlertConfig::default(),
        );

        assert_eq!(kinds(&events), vec!["vah_breakout", "left_value_area"]);
        assert_eq!(
            events[1].kind,
            AlertKind::LeftValueArea {
                direction: Direction::Up,
                val: 95.0,
                vah: 100.0
            }
        );
    }

    #[test]
    fn test_breakdown_and_leave_down() {
        let profile = create_test_profile(95.0, 97.0, 100.0);
        let events = classify(
            &create_test_key(),
            Some(96.0),
            94.0,
            &profile,
            &AlertConfig::default(),
        );

        assert_eq!(kinds(&events), vec!["val_breakdown", "left_value_area"]);
        assert!(matches!(
            events[1].kind,
            AlertKind::LeftValueArea {
                direction: Direction::Down,
                ..
            }
        ));
    }

    #[test]
    fn test_entering_value_area() {
        let profile = create_test_profile(95.0, 100.0, 105.0);
        let events = classify(
            &create_test_key(),
            Some(110.0),
            104.0,
            &profile,
            &AlertConfig::default(),
        );

        assert_eq!(kinds(&events), vec!["entered_value_area"]);
    }

    #[test]
    fn test_poc_touch_is_rising_edge() {
        let profile = create_test_profile(95.0, 100.0, 105.0);
        let config = AlertConfig::default();
        let key = create_test_key();

        // 1% away, then 0.2% away
        let events = classify(&key, Some(101.0), 100.2, &profile, &config);
        assert_eq!(events, vec![AlertEvent {
            symbol: "BTCUSDT".to_string(),
            interval: Interval::OneHour,
            price: 100.2,
            previous_price: 101.0,
            kind: AlertKind::PocTouch { poc: 100.0 },
        }]);

        // Still inside the band: no repeat
        assert!(classify(&key, Some(100.2), 99.9, &profile, &config).is_empty());
    }

    #[test]
    fn test_poc_touch_threshold_boundary() {
        let profile = create_test_profile(95.0, 100.0, 105.0);
        let mut config = AlertConfig::default();
        config.poc_touch.threshold_percent = 1.0;
        let key = create_test_key();

        // Exactly at the threshold is not a touch
        assert!(classify(&key, Some(102.0), 101.0, &profile, &config).is_empty());
        // Previous exactly at the threshold counts as outside
        assert_eq!(
            kinds(&classify(&key, Some(101.0), 100.5, &profile, &config)),
            vec!["poc_touch"]
        );
    }

    #[test]
    fn test_poc_touch_skipped_for_non_positive_poc() {
        let profile = create_test_profile(-1.0, 0.0, 1.0);
        let events = classify(
            &create_test_key(),
            Some(0.5),
            0.0,
            &profile,
            &AlertConfig::default(),
        );
        assert!(events.iter().all(|e| e.kind.name() != "poc_touch"));
    }

    #[test]
    fn test_disabled_alert_types() {
        let profile = create_test_profile(95.0, 97.0, 100.0);
        let key = create_test_key();

        let mut config = AlertConfig::default();
        config.left_value_area.enabled = false;
        assert_eq!(
            kinds(&classify(&key, Some(99.0), 101.0, &profile, &config)),
            vec!["vah_breakout"]
        );

        config.enabled = false;
        assert!(classify(&key, Some(99.0), 101.0, &profile, &config).is_empty());
    }

    #[test]
    fn test_detector_breakout_fires_once() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let mut detector = LevelCrossingDetector::new(AlertConfig::default(), PriceStateStore::new());
        let key = create_test_key();

        assert!(detector.observe(&key, 99.0, &profile).is_empty());

        let fired: Vec<usize> = [101.0, 102.0, 103.0, 101.5]
            .iter()
            .map(|price| {
                detector
                    .observe(&key, *price, &profile)
                    .iter()
                    .filter(|e| matches!(e.kind, AlertKind::VahBreakout { .. }))
                    .count()
            })
            .collect();

        assert_eq!(fired, vec![1, 0, 0, 0]);
        assert_eq!(detector.state(&key).map(|s| s.price), Some(101.5));
    }

    #[test]
    fn test_detector_disabled_still_tracks_prices() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let config = AlertConfig {
            enabled: false,
            ..AlertConfig::default()
        };
        let mut detector = LevelCrossingDetector::new(config, PriceStateStore::new());
        let key = create_test_key();

        assert!(detector.observe(&key, 99.0, &profile).is_empty());
        assert!(detector.observe(&key, 101.0, &profile).is_empty());
        assert_eq!(detector.store().previous_price(&key), Some(101.0));
    }

    #[test]
    fn test_detector_keys_are_independent() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let mut detector = LevelCrossingDetector::new(AlertConfig::default(), PriceStateStore::new());
        let shared = create_test_key();
        let alice = shared.clone().for_subscriber("alice");

        detector.observe(&shared, 99.0, &profile);

        // First observation for the subscriber key is a cold start
        assert!(detector.observe(&alice, 101.0, &profile).is_empty());
        assert_eq!(detector.observe(&shared, 101.0, &profile).len(), 1);
        assert_eq!(detector.store().len(), 2);
    }

    #[test]
    fn test_evict_resets_to_cold_start() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let mut detector = LevelCrossingDetector::new(AlertConfig::default(), PriceStateStore::new());
        let key = create_test_key();

        detector.observe(&key, 99.0, &profile);
        assert!(detector.evict(&key));
        assert!(!detector.evict(&key));
        assert!(detector.observe(&key, 101.0, &profile).is_empty());
    }

    #[test]
    fn test_zero_previous_price_is_not_a_cold_start() {
        let profile = create_test_profile(100.0, 100.0, 100.0);
        let events = classify(
            &create_test_key(),
            Some(0.0),
            101.0,
            &profile,
            &AlertConfig::default(),
        );
        assert_eq!(kinds(&events), vec!["vah_breakout"]);
    }
}
