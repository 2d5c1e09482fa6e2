use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use kameo::actor::ActorRef;
use kameo::request::MessageSend;
use tracing::{debug, error, info, warn};

use frvp_alerts::alerts::{AlertSink, PriceKey, TracingAlertSink};
use frvp_alerts::config::AppConfig;
use frvp_alerts::logging::{cleanup_old_logs, init_dual_logging, init_simple_logging};
use frvp_alerts::market::BinanceKlinesClient;
use frvp_alerts::monitor::{EvaluationError, MonitorActor, MonitorAsk, MonitorReply};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Pre-load configuration to get logging settings
    let config = match AppConfig::from_toml(CONFIG_PATH) {
        Ok(config) => {
            // Simple print until logging is initialized
            println!("✅ Loaded configuration from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            println!("⚠️ Failed to load {}: {}. Using default configuration", CONFIG_PATH, e);
            AppConfig::default()
        }
    };

    let _logging_guard = match init_dual_logging(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("❌ Failed to initialize logging system: {}", e);
            if let Err(e) = init_simple_logging(&config.logging.level_filter) {
                eprintln!("❌ Failed to initialize console logging: {}", e);
            }
            error!("⚠️ Using fallback console-only logging due to error: {}", e);
            None
        }
    };

    if let Err(e) = cleanup_old_logs(&config.logging.log_dir, config.logging.cleanup_days) {
        warn!("⚠️ Failed to clean up old log files: {}", e);
    }

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        std::process::exit(1);
    }
    config.warn_if_unusual();

    info!(
        symbols = ?config.application.symbols,
        intervals = ?config.application.intervals,
        poll_interval_seconds = config.application.poll_interval_seconds,
        alerts_enabled = config.alerts.enabled,
        source = %config.source.base_url,
        "🔧 Configuration loaded"
    );

    let client = match BinanceKlinesClient::new(
        config.source.base_url.clone(),
        config.source.request_timeout(),
        config.source.min_request_interval(),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Failed to create candle source: {}", e);
            std::process::exit(1);
        }
    };

    let sink: Arc<dyn AlertSink> = Arc::new(TracingAlertSink);
    let monitor = kameo::spawn(MonitorActor::new(
        Box::new(client),
        config.alerts,
        config.profile.clone(),
        config.source.extra_lookback,
        sink,
    ));

    let keys = config.price_keys();
    info!(
        "🎯 Monitoring {} series every {:?}. Press Ctrl+C to stop",
        keys.len(),
        config.poll_interval()
    );

    let mut ticker = tokio::time::interval(config.poll_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_tick(&monitor, &keys, &config.application.alert_target).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Shutdown signal received");
                break;
            }
        }
    }

    if let Ok(MonitorReply::Statistics(stats)) = monitor.ask(MonitorAsk::GetStatistics).send().await {
        info!(
            "📊 {} evaluations, {} failed, {} alerts, {} tracked series",
            stats.evaluations, stats.failed_evaluations, stats.alerts_emitted, stats.tracked_keys
        );
    }

    if let Err(e) = monitor.stop_gracefully().await {
        warn!("⚠️ Failed to stop monitor actor: {}", e);
    }
    monitor.wait_for_stop().await;

    info!("🏁 Graceful shutdown completed");
}

/// Evaluate every configured series once
async fn run_tick(monitor: &ActorRef<MonitorActor>, keys: &[PriceKey], target: &str) {
    let tick_start = Instant::now();

    let results = join_all(keys.iter().map(|key| {
        monitor
            .ask(MonitorAsk::Evaluate {
                key: key.clone(),
                target: target.to_string(),
            })
            .send()
    }))
    .await;

    let mut alerts = 0;
    let mut failures = 0;
    for (key, result) in keys.iter().zip(results) {
        match result {
            Ok(MonitorReply::Evaluation(report)) => alerts += report.events.len(),
            Ok(other) => warn!("Unexpected reply for {}: {:?}", key, other),
            Err(e) => {
                failures += 1;
                match EvaluationError::from(e) {
                    // Monitor unreachable, nothing was logged yet
                    failure @ EvaluationError::Actor(_) => error!("❌ Evaluation of {} failed: {}", key, failure),
                    // Already logged by the actor
                    failure => debug!("Evaluation of {} failed: {}", key, failure),
                }
            }
        }
    }

    info!(
        "✅ Tick completed in {:?}: {} series, {} alerts, {} failures",
        tick_start.elapsed(),
        keys.len(),
        alerts,
        failures
    );
}
