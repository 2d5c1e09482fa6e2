use serde::{Deserialize, Serialize};
use std::fmt;

use super::structs::VolumeProfile;

/// Where a price sits relative to the value area and POC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPosition {
    /// Above VAH
    AboveValueArea,
    /// Below VAL
    BelowValueArea,
    /// Inside the value area, above POC
    InsideAbovePoc,
    /// Inside the value area, at or below POC
    InsideBelowPoc,
}

impl MarketPosition {
    pub fn classify(price: f64, profile: &VolumeProfile) -> Self {
        if price > profile.vah {
            MarketPosition::AboveValueArea
        } else if price < profile.val {
            MarketPosition::BelowValueArea
        } else if price > profile.poc {
            MarketPosition::InsideAbovePoc
        } else {
            MarketPosition::InsideBelowPoc
        }
    }

    pub fn is_inside_value_area(&self) -> bool {
        matches!(self, MarketPosition::InsideAbovePoc | MarketPosition::InsideBelowPoc)
    }
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketPosition::AboveValueArea => write!(f, "above value area"),
            MarketPosition::BelowValueArea => write!(f, "below value area"),
            MarketPosition::InsideAbovePoc => write!(f, "inside value area, above POC"),
            MarketPosition::InsideBelowPoc => write!(f, "inside value area, at or below POC"),
        }
    }
}

/// Signed percent distance from a price to each key level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelDistances {
    pub to_poc_percent: f64,
    pub to_vah_percent: f64,
    pub to_val_percent: f64,
}

impl LevelDistances {
    pub fn from_profile(price: f64, profile: &VolumeProfile) -> Self {
        Self {
            to_poc_percent: percent_distance(price, profile.poc),
            to_vah_percent: percent_distance(price, profile.vah),
            to_val_percent: percent_distance(price, profile.val),
        }
    }
}

/// `(price - level) / level * 100`, 0 for a non-positive level
pub fn percent_distance(price: f64, level: f64) -> f64 {
    if level <= 0.0 {
        return 0.0;
    }
    (price - level) / level * 100.0
}

/// Position plus distances for one price against one profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub price: f64,
    pub position: MarketPosition,
    pub distances: LevelDistances,
}

impl PriceAnalysis {
    pub fn new(price: f64, profile: &VolumeProfile) -> Self {
        Self {
            price,
            position: MarketPosition::classify(price, profile),
            distances: LevelDistances::from_profile(price, profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::structs::Candle;
    use crate::volume_profile::calculator::compute;
    use crate::volume_profile::structs::ProfileSettings;

    fn create_test_profile() -> VolumeProfile {
        // Buckets [10, 20, 10] between 100 and 103: POC 101.5, VAL 101.5, VAH 102.5
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 100.0, 101.0, 10.0),
            Candle::new(1, 101.0, 102.0, 101.0, 102.0, 20.0),
            Candle::new(2, 102.0, 103.0, 102.0, 103.0, 10.0),
        ];
        compute(&candles, &ProfileSettings::new(3, 3, 70.0)).unwrap()
    }

    #[test]
    fn test_classify_position() {
        let profile = create_test_profile();

        assert_eq!(MarketPosition::classify(103.0, &profile), MarketPosition::AboveValueArea);
        assert_eq!(MarketPosition::classify(100.0, &profile), MarketPosition::BelowValueArea);
        assert_eq!(MarketPosition::classify(102.0, &profile), MarketPosition::InsideAbovePoc);
        assert_eq!(MarketPosition::classify(101.5, &profile), MarketPosition::InsideBelowPoc);

        // Boundaries belong to the value area
        assert!(MarketPosition::classify(102.5, &profile).is_inside_value_area());
        assert!(!MarketPosition::classify(102.51, &profile).is_inside_value_area());
    }

    #[test]
    fn test_level_distances() {
        let profile = create_test_profile();
        let distances = LevelDistances::from_profile(103.53, &profile);

        assert!((distances.to_poc_percent - 2.0).abs() < 1e-9);
        assert!(distances.to_vah_percent > 0.0);
        assert!(distances.to_val_percent > distances.to_vah_percent);
        assert_eq!(percent_distance(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_price_analysis() {
        let profile = create_test_profile();
        let analysis = PriceAnalysis::new(99.0, &profile);

        assert_eq!(analysis.position, MarketPosition::BelowValueArea);
        assert!(analysis.distances.to_val_percent < 0.0);
        assert_eq!(analysis.position.to_string(), "below value area");
    }
}
