use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::common::constants::{
    BINANCE_KLINES_PATH, BINANCE_MAX_KLINES_PER_REQUEST, DEFAULT_RETRY_AFTER_SECONDS,
};

use super::errors::MarketDataError;
use super::source::CandleSource;
use super::structs::{Candle, Interval, TimestampMS};

/// Binance spot REST client for klines
pub struct BinanceKlinesClient {
    client: reqwest::Client,
    base_url: String,
    last_request_time: Option<Instant>,
    min_request_interval: Duration,
}

impl BinanceKlinesClient {
    /// Create a new Binance klines client
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        min_request_interval: Duration,
    ) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MarketDataError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_request_time: None,
            min_request_interval,
        })
    }

    /// Build the klines URL, clamping the limit to what one request can return
    fn build_klines_url(&self, symbol: &str, interval: Interval, count: usize) -> String {
        let limit = count.clamp(1, BINANCE_MAX_KLINES_PER_REQUEST);
        format!(
            "{}{}?symbol={}&interval={}&limit={}",
            self.base_url,
            BINANCE_KLINES_PATH,
            symbol.to_uppercase(),
            interval.as_str(),
            limit
        )
    }

    async fn respect_rate_limit(&mut self) {
        if let Some(last_request) = self.last_request_time {
            let elapsed = last_request.elapsed();
            if elapsed < self.min_request_interval {
                let delay = self.min_request_interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next request", delay);
                sleep(delay).await;
            }
        }
        self.last_request_time = Some(Instant::now());
    }

    /// Parse Binance kline arrays into candles
    fn parse_klines_response(raw_klines: Vec<serde_json::Value>) -> Result<Vec<Candle>, MarketDataError> {
        let mut candles = Vec::with_capacity(raw_klines.len());

        for kline in raw_klines {
            let array = kline
                .as_array()
                .ok_or_else(|| MarketDataError::Parse("Expected kline to be an array".to_string()))?;

            if array.len() < 6 {
                return Err(MarketDataError::Parse(format!(
                    "Expected at least 6 elements in kline array, got {}",
                    array.len()
                )));
            }

            let candle = Candle {
                time: Self::parse_timestamp(&array[0])?,
                open: Self::parse_f64(&array[1])?,
                high: Self::parse_f64(&array[2])?,
                low: Self::parse_f64(&array[3])?,
                close: Self::parse_f64(&array[4])?,
                volume: Self::parse_f64(&array[5])?,
            };

            if !candle.is_consistent() {
                return Err(MarketDataError::Parse(format!(
                    "Inconsistent kline at {}: o={} h={} l={} c={} v={}",
                    candle.time, candle.open, candle.high, candle.low, candle.close, candle.volume
                )));
            }

            candles.push(candle);
        }

        Ok(candles)
    }

    /// Map a klines response to candles or to the error its status and body describe
    fn map_response(
        status: StatusCode,
        retry_after: Option<&str>,
        body: &str,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            let retry_after = retry_after
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
            return Err(MarketDataError::RateLimit(format!(
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            // {"code":-1121,"msg":"Invalid symbol."}
            if body.contains("-1121") {
                return Err(MarketDataError::InvalidSymbol(symbol.to_string()));
            }
            return Err(MarketDataError::Http(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let raw_klines: Vec<serde_json::Value> = serde_json::from_str(body)
            .map_err(|e| MarketDataError::Parse(format!("Failed to parse JSON: {}", e)))?;

        let candles = Self::parse_klines_response(raw_klines)?;
        if candles.is_empty() {
            return Err(MarketDataError::NoData(format!("{} {}", symbol, interval)));
        }
        Ok(candles)
    }

    fn parse_timestamp(value: &serde_json::Value) -> Result<TimestampMS, MarketDataError> {
        value
            .as_i64()
            .ok_or_else(|| MarketDataError::Parse(format!("Expected timestamp to be i64, got: {:?}", value)))
    }

    /// Binance sends prices and volumes as strings
    fn parse_f64(value: &serde_json::Value) -> Result<f64, MarketDataError> {
        match value {
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| MarketDataError::Parse(format!("Failed to parse '{}' as f64", s))),
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| MarketDataError::Parse(format!("Failed to convert number to f64: {:?}", n))),
            _ => Err(MarketDataError::Parse(format!("Expected string or number, got: {:?}", value))),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceKlinesClient {
    async fn fetch_candles(
        &mut self,
        symbol: &str,
        interval: Interval,
        count: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if count > BINANCE_MAX_KLINES_PER_REQUEST {
            warn!(
                "Requested {} klines for {} {}, Binance returns at most {}",
                count, symbol, interval, BINANCE_MAX_KLINES_PER_REQUEST
            );
        }

        self.respect_rate_limit().await;

        let url = self.build_klines_url(symbol, interval, count);
        debug!("Fetching klines from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::Network(format!("Failed to read response body: {}", e)))?;

        let candles = Self::map_response(status, retry_after.as_deref(), &body, symbol, interval)?;

        info!("✅ Fetched {} klines for {} {}", candles.len(), symbol, interval);
        Ok(candles)
    }

    fn source_name(&self) -> &'static str {
        "binance"
    }
}
