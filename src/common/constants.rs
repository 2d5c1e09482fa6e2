/// Defaults shared by configuration, the candle source and the monitor

// Volume profile defaults
pub const DEFAULT_WINDOW_SIZE: usize = 150;
pub const DEFAULT_LEVEL_COUNT: usize = 24;
pub const DEFAULT_VALUE_AREA_PERCENT: f64 = 70.0;

// Recommended operating ranges (outside these we only warn)
pub const RECOMMENDED_WINDOW_SIZE: (usize, usize) = (50, 500);
pub const RECOMMENDED_LEVEL_COUNT: (usize, usize) = (10, 100);
pub const RECOMMENDED_VALUE_AREA_PERCENT: (f64, f64) = (50.0, 100.0);

// Extra bars requested on top of the window so the source can fall short without failing
pub const DEFAULT_EXTRA_LOOKBACK: usize = 50;

// Alerts
pub const DEFAULT_POC_TOUCH_THRESHOLD_PERCENT: f64 = 0.5;
pub const DEFAULT_ALERT_TARGET: &str = "log";

// Binance spot REST
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const BINANCE_KLINES_PATH: &str = "/api/v3/klines";
pub const BINANCE_MAX_KLINES_PER_REQUEST: usize = 1000;
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RETRY_AFTER_SECONDS: u64 = 60;

// Monitor
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 900;

// Logging
pub const LOG_FILE_PREFIX: &str = "frvp_alerts";
pub const DEFAULT_LOG_FILTER: &str = "info,frvp_alerts=info";
pub const DEFAULT_LOG_CLEANUP_DAYS: u32 = 30;
