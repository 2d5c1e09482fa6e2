use rustc_hash::FxHashMap;

use super::structs::{PriceKey, PriceState};

/// Last observed price (and profile) per key.
///
/// Owned by a single detector; callers that share it across tasks go through the
/// monitor actor's mailbox, which serializes access per key.
#[derive(Debug, Default)]
pub struct PriceStateStore {
    states: FxHashMap<PriceKey, PriceState>,
}

impl PriceStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PriceKey) -> Option<&PriceState> {
        self.states.get(key)
    }

    pub fn previous_price(&self, key: &PriceKey) -> Option<f64> {
        self.states.get(key).map(|state| state.price)
    }

    /// Store the new state, returning the one it replaced
    pub fn insert(&mut self, key: PriceKey, state: PriceState) -> Option<PriceState> {
        self.states.insert(key, state)
    }

    pub fn remove(&mut self, key: &PriceKey) -> Option<PriceState> {
        self.states.remove(key)
    }

    pub fn contains(&self, key: &PriceKey) -> bool {
        self.states.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Tracked keys in a stable order
    pub fn keys(&self) -> Vec<PriceKey> {
        let mut keys: Vec<PriceKey> = self.states.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::structs::{Candle, Interval};
    use crate::volume_profile::{compute, ProfileSettings};

    fn create_test_state(price: f64) -> PriceState {
        let candles = vec![Candle::new(0, 100.0, 101.0, 99.0, 100.5, 10.0)];
        PriceState {
            price,
            profile: compute(&candles, &ProfileSettings::new(1, 4, 70.0)).unwrap(),
        }
    }

    #[test]
    fn test_insert_replace_remove() {
        let mut store = PriceStateStore::new();
        let key = PriceKey::new("BTCUSDT", Interval::OneHour);

        assert!(store.is_empty());
        assert_eq!(store.previous_price(&key), None);

        assert!(store.insert(key.clone(), create_test_state(100.0)).is_none());
        let replaced = store.insert(key.clone(), create_test_state(101.0)).unwrap();
        assert_eq!(replaced.price, 100.0);
        assert_eq!(store.previous_price(&key), Some(101.0));
        assert_eq!(store.len(), 1);

        assert!(store.remove(&key).is_some());
        assert!(!store.contains(&key));
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut store = PriceStateStore::new();
        store.insert(PriceKey::new("ETHUSDT", Interval::OneHour), create_test_state(1.0));
        store.insert(PriceKey::new("BTCUSDT", Interval::FourHours), create_test_state(1.0));
        store.insert(PriceKey::new("BTCUSDT", Interval::OneHour), create_test_state(1.0));

        let keys = store.keys();
        assert_eq!(keys[0], PriceKey::new("BTCUSDT", Interval::OneHour));
        assert_eq!(keys[1], PriceKey::new("BTCUSDT", Interval::FourHours));
        assert_eq!(keys[2].symbol, "ETHUSDT");
    }
}
