use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alerts::detector::LevelCrossingDetector;
use crate::alerts::structs::{AlertEvent, PriceKey};
use crate::market::source::CandleSource;
use crate::volume_profile::calculator::compute;
use crate::volume_profile::position::PriceAnalysis;
use crate::volume_profile::structs::{ProfileSettings, VolumeProfile};

use super::errors::EvaluationError;

/// Result of one fetch, compute and classify pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub key: PriceKey,
    /// Close of the most recent candle
    pub price: f64,
    pub profile: VolumeProfile,
    pub analysis: PriceAnalysis,
    pub events: Vec<AlertEvent>,
    pub evaluated_at: DateTime<Utc>,
}

/// Number of candles to request for a window
pub fn request_size(settings: &ProfileSettings, extra_lookback: usize) -> usize {
    settings.window_size.saturating_add(extra_lookback)
}

/// Fetch candles for `key`, compute the profile over the last window and run the
/// latest close through the detector.
///
/// Errors propagate unchanged; the detector state is only touched after a profile
/// was computed successfully.
pub async fn evaluate(
    source: &mut dyn CandleSource,
    detector: &mut LevelCrossingDetector,
    settings: &ProfileSettings,
    extra_lookback: usize,
    key: &PriceKey,
) -> Result<EvaluationReport, EvaluationError> {
    let count = request_size(settings, extra_lookback);
    let candles = source.fetch_candles(&key.symbol, key.interval, count).await?;
    debug!(
        "📥 {} returned {} candles for {} (requested {}), latest opened {}",
        source.source_name(),
        candles.len(),
        key,
        count,
        candles
            .last()
            .and_then(|c| c.open_time_utc())
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string())
    );

    let profile = compute(&candles, settings)?;
    // compute() succeeding guarantees at least one candle
    let price = candles.last().map(|c| c.close).unwrap_or(profile.poc);

    let analysis = PriceAnalysis::new(price, &profile);
    let events = detector.observe(key, price, &profile);

    info!(
        "📊 {} price {} {} | POC {:.4} VAH {:.4} VAL {:.4} | {} alert(s)",
        key,
        price,
        analysis.position,
        profile.poc,
        profile.vah,
        profile.val,
        events.len()
    );

    Ok(EvaluationReport {
        key: key.clone(),
        price,
        profile,
        analysis,
        events,
        evaluated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::store::PriceStateStore;
    use crate::alerts::structs::{AlertConfig, AlertKind};
    use crate::market::errors::MarketDataError;
    use crate::market::source::MockCandleSource;
    use crate::market::structs::{Candle, Interval};
    use crate::volume_profile::errors::ProfileError;
    use crate::volume_profile::position::MarketPosition;

    /// Window of 4 candles trading 100..=104 with one heavy candle at 101..102,
    /// followed by a last candle closing at `last_close`.
    fn create_test_candles(last_close: f64) -> Vec<Candle> {
        vec![
            Candle::new(0, 100.0, 101.0, 100.0, 101.0, 10.0),
            Candle::new(1, 101.0, 102.0, 101.0, 102.0, 50.0),
            Candle::new(2, 102.0, 103.0, 102.0, 103.0, 10.0),
            Candle::new(3, 103.0, 104.0, 103.0, 103.5, 10.0),
            Candle::new(4, 103.5, 104.0, 100.0, last_close, 1.0),
        ]
    }

    fn create_test_detector() -> LevelCrossingDetector {
        LevelCrossingDetector::new(AlertConfig::default(), PriceStateStore::new())
    }

    #[tokio::test]
    async fn test_evaluate_requests_window_plus_lookback() {
        let mut source = MockCandleSource::new();
        source
            .expect_fetch_candles()
            .withf(|_, interval, count| *interval == Interval::OneHour && *count == 55)
            .times(1)
            .returning(|_, _, _| Ok(create_test_candles(101.5)));
        source.expect_source_name().return_const("mock");

        let mut detector = create_test_detector();
        let key = PriceKey::new("BTCUSDT", Interval::OneHour);
        let settings = ProfileSettings::new(5, 4, 70.0);

        let report = tokio_test::assert_ok!(evaluate(&mut source, &mut detector, &settings, 50, &key).await);

        assert_eq!(report.price, 101.5);
        assert_eq!(report.profile.candle_count, 5);
        assert!(report.events.is_empty(), "first evaluation only seeds state");
        assert_eq!(detector.store().previous_price(&key), Some(101.5));
    }

    #[tokio::test]
    async fn test_evaluate_propagates_source_failure_without_touching_state() {
        let mut source = MockCandleSource::new();
        source
            .expect_fetch_candles()
            .returning(|_, _, _| Err(MarketDataError::Network("connection reset".to_string())));
        source.expect_source_name().return_const("mock");

        let mut detector = create_test_detector();
        let key = PriceKey::new("BTCUSDT", Interval::OneHour);

        let result = evaluate(&mut source, &mut detector, &ProfileSettings::default(), 50, &key).await;

        assert!(matches!(
            result,
            Err(EvaluationError::DataUnavailable(MarketDataError::Network(_)))
        ));
        assert!(detector.store().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_reports_insufficient_data() {
        let mut source = MockCandleSource::new();
        source
            .expect_fetch_candles()
            .returning(|_, _, _| Ok(create_test_candles(101.0)));
        source.expect_source_name().return_const("mock");

        let mut detector = create_test_detector();
        let key = PriceKey::new("ETHUSDT", Interval::FourHours);
        let settings = ProfileSettings::new(150, 24, 70.0);

        let error = tokio_test::assert_err!(evaluate(&mut source, &mut detector, &settings, 50, &key).await);

        assert_eq!(
            error,
            EvaluationError::Profile(ProfileError::InsufficientData {
                required: 150,
                available: 5
            })
        );
        assert!(detector.store().is_empty());
    }

    #[tokio::test]
    async fn test_second_evaluation_detects_breakout() {
        let mut source = MockCandleSource::new();
        let mut closes = vec![101.5, 104.0].into_iter();
        source
            .expect_fetch_candles()
            .times(2)
            .returning(move |_, _, _| Ok(create_test_candles(closes.next().unwrap_or(101.5))));
        source.expect_source_name().return_const("mock");

        let mut detector = create_test_detector();
        let key = PriceKey::new("BTCUSDT", Interval::OneHour);
        let settings = ProfileSettings::new(5, 4, 70.0);

        evaluate(&mut source, &mut detector, &settings, 0, &key).await.unwrap();
        let report = evaluate(&mut source, &mut detector, &settings, 0, &key).await.unwrap();

        assert_eq!(report.analysis.position, MarketPosition::AboveValueArea);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e.kind, AlertKind::VahBreakout { .. })));
        assert!(report.events.iter().all(|e| e.price == 104.0 && e.previous_price == 101.5));
    }

    #[test]
    fn test_request_size() {
        assert_eq!(request_size(&ProfileSettings::new(150, 24, 70.0), 50), 200);
        assert_eq!(request_size(&ProfileSettings::new(usize::MAX, 24, 70.0), 50), usize::MAX);
    }
}
