use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::errors::MarketDataError;
use super::structs::{Candle, Interval};

/// Supplier of chronologically ordered candles (oldest first)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `count` of the most recent candles for a symbol and interval
    async fn fetch_candles(
        &mut self,
        symbol: &str,
        interval: Interval,
        count: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}

type SeriesMap = HashMap<(String, Interval), Vec<Candle>>;

/// In-memory candle source used for replays and tests.
///
/// Clones share the same series, so a caller can keep a handle and append candles
/// while another component (e.g. the monitor actor) owns the source.
#[derive(Debug, Clone, Default)]
pub struct MemoryCandleSource {
    series: Arc<RwLock<SeriesMap>>,
}

impl MemoryCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole series for a symbol/interval
    pub async fn set_series(&self, symbol: &str, interval: Interval, candles: Vec<Candle>) {
        self.series
            .write()
            .await
            .insert((symbol.to_string(), interval), candles);
    }

    /// Append one candle to a series, creating it if needed
    pub async fn push_candle(&self, symbol: &str, interval: Interval, candle: Candle) {
        self.series
            .write()
            .await
            .entry((symbol.to_string(), interval))
            .or_default()
            .push(candle);
    }

    pub async fn len(&self, symbol: &str, interval: Interval) -> usize {
        self.series
            .read()
            .await
            .get(&(symbol.to_string(), interval))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CandleSource for MemoryCandleSource {
    async fn fetch_candles(
        &mut self,
        symbol: &str,
        interval: Interval,
        count: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let series = self.series.read().await;
        let candles = series
            .get(&(symbol.to_string(), interval))
            .filter(|candles| !candles.is_empty())
            .ok_or_else(|| MarketDataError::NoData(format!("{} {}", symbol, interval)))?;

        let start = candles.len().saturating_sub(count);
        debug!(
            "Serving {} of {} in-memory candles for {} {}",
            candles.len() - start,
            candles.len(),
            symbol,
            interval
        );
        Ok(candles[start..].to_vec())
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}
