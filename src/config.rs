use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::alerts::structs::{AlertConfig, PriceKey};
use crate::common::constants::{
    BINANCE_BASE_URL, DEFAULT_ALERT_TARGET, DEFAULT_EXTRA_LOOKBACK, DEFAULT_MIN_REQUEST_INTERVAL_MS,
    DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_SYMBOL,
};
use crate::logging::LoggingConfig;
use crate::market::structs::Interval;
use crate::volume_profile::structs::{ProfileConfig, ProfileSettings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn default_symbols() -> Vec<String> {
    vec![DEFAULT_SYMBOL.to_string()]
}

fn default_intervals() -> Vec<Interval> {
    vec![Interval::OneHour, Interval::FourHours]
}

fn default_poll_interval_seconds() -> u64 {
    DEFAULT_POLL_INTERVAL_SECONDS
}

fn default_alert_target() -> String {
    DEFAULT_ALERT_TARGET.to_string()
}

fn default_base_url() -> String {
    BINANCE_BASE_URL.to_string()
}

fn default_extra_lookback() -> usize {
    DEFAULT_EXTRA_LOOKBACK
}

fn default_min_request_interval_ms() -> u64 {
    DEFAULT_MIN_REQUEST_INTERVAL_MS
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

/// `[application]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_intervals")]
    pub intervals: Vec<Interval>,
    /// Seconds between evaluation ticks
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    /// Delivery target handed to the alert sink
    #[serde(default = "default_alert_target")]
    pub alert_target: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            intervals: default_intervals(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            alert_target: default_alert_target(),
        }
    }
}

/// `[source]` section: candle source connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Candles requested on top of the window size
    #[serde(default = "default_extra_lookback")]
    pub extra_lookback: usize,
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            extra_lookback: DEFAULT_EXTRA_LOOKBACK,
            min_request_interval_ms: DEFAULT_MIN_REQUEST_INTERVAL_MS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Full `config.toml`; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub application: ApplicationConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reject configurations that cannot produce a meaningful profile or alert
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application.symbols.is_empty() {
            return Err(ConfigError::Validation("application.symbols must not be empty".to_string()));
        }

        if let Some(symbol) = self.application.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "application.symbols contains an empty symbol: {:?}",
                symbol
            )));
        }

        if self.application.intervals.is_empty() {
            return Err(ConfigError::Validation("application.intervals must not be empty".to_string()));
        }

        if self.application.poll_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "application.poll_interval_seconds must be at least 1".to_string(),
            ));
        }

        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("source.base_url must not be empty".to_string()));
        }

        self.profile
            .validate()
            .map_err(|e| ConfigError::Validation(format!("profile: {}", e)))?;

        self.alerts
            .validate()
            .map_err(|e| ConfigError::Validation(format!("alerts: {}", e)))?;

        Ok(())
    }

    /// Warn about settings outside the recommended operating ranges
    pub fn warn_if_unusual(&self) {
        for interval in &self.application.intervals {
            self.settings_for(*interval)
                .warn_if_unusual(&format!("profile {}", interval));
        }

        if self.source.extra_lookback == 0 {
            warn!("source.extra_lookback is 0; a short response from the source will fail the window");
        }
    }

    pub fn settings_for(&self, interval: Interval) -> ProfileSettings {
        self.profile.resolve_for_interval(interval)
    }

    /// One key per configured symbol and interval
    pub fn price_keys(&self) -> Vec<PriceKey> {
        self.application
            .symbols
            .iter()
            .flat_map(|symbol| {
                self.application
                    .intervals
                    .iter()
                    .map(move |interval| PriceKey::new(symbol.to_uppercase(), *interval))
            })
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.application.poll_interval_seconds)
    }
}
