//! Dual output logging (console + rotating file)
//!
//! Console output is human-readable; the file output is JSON by default so alert
//! history can be grepped or shipped elsewhere after the fact.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::common::constants::{DEFAULT_LOG_CLEANUP_DAYS, DEFAULT_LOG_FILTER, LOG_FILE_PREFIX};

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_level_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_true() -> bool {
    true
}

fn default_cleanup_days() -> u32 {
    DEFAULT_LOG_CLEANUP_DAYS
}

/// Logging configuration (`[logging]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory to store log files
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Filter directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_level_filter")]
    pub level_filter: String,
    #[serde(default)]
    pub rotation: LogRotation,
    #[serde(default = "default_true")]
    pub console_timestamps: bool,
    /// JSON lines in the log file instead of plain text
    #[serde(default = "default_true")]
    pub file_json_format: bool,
    /// Log files older than this are removed at startup
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    /// For debugging noisy runs
    Hourly,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            level_filter: default_level_filter(),
            rotation: LogRotation::Daily,
            console_timestamps: true,
            file_json_format: true,
            cleanup_days: DEFAULT_LOG_CLEANUP_DAYS,
        }
    }
}

/// Initialize console + rotating file logging.
///
/// Files are written as `<log_dir>/frvp_alerts.log.YYYY-MM-DD` (or `-HH` with
/// hourly rotation). The returned guard must be kept alive for as long as the
/// application runs, otherwise buffered file output is lost.
pub fn init_dual_logging(
    config: &LoggingConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level_filter));
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level_filter));

    let file_name = format!("{}.log", LOG_FILE_PREFIX);
    let file_appender = match config.rotation {
        LogRotation::Daily => tracing_appender::rolling::daily(&config.log_dir, &file_name),
        LogRotation::Hourly => tracing_appender::rolling::hourly(&config.log_dir, &file_name),
    };
    let (file_writer, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_timer(if config.console_timestamps {
            ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string())
        } else {
            ChronoUtc::new(String::new())
        })
        .with_filter(console_filter);

    let file_layer = if config.file_json_format {
        fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string()))
            .with_filter(file_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_filter(file_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_dir = %config.log_dir,
        rotation = ?config.rotation,
        json_format = config.file_json_format,
        "📁 Dual logging initialized - console + rotating files"
    );

    Ok(guard)
}

/// Console-only logging, used when the log directory is unusable
pub fn init_simple_logging(level_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter)),
        )
        .try_init()?;

    tracing::info!("🖥️ Simple console logging initialized");
    Ok(())
}

fn is_own_log_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX) && name.contains(".log"))
            .unwrap_or(false)
}

/// Log files written by this application, sorted by name (and thus by date)
pub fn list_log_files(log_dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(log_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| is_own_log_file(path))
                .collect()
        })
        .unwrap_or_default();

    files.sort();
    files
}

/// Remove own log files last modified more than `keep_days` ago
pub fn cleanup_old_logs(log_dir: &str, keep_days: u32) -> Result<usize, std::io::Error> {
    let cutoff_time = SystemTime::now() - Duration::from_secs(keep_days as u64 * 24 * 3600);
    let mut removed_count = 0;

    for path in list_log_files(log_dir) {
        let modified = path.metadata().and_then(|metadata| metadata.modified());
        if let Ok(modified) = modified {
            if modified < cutoff_time && std::fs::remove_file(&path).is_ok() {
                removed_count += 1;
                tracing::debug!("🗑️ Removed old log file: {:?}", path);
            }
        }
    }

    if removed_count > 0 {
        tracing::info!("🧹 Cleaned up {} old log files (older than {} days)", removed_count, keep_days);
    }

    Ok(removed_count)
}
