use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::{ActorStopReason, BoxError};
use kameo::message::{Context, Message};
use kameo::{mailbox::unbounded::UnboundedMailbox, Actor};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::alerts::detector::LevelCrossingDetector;
use crate::alerts::sink::AlertSink;
use crate::alerts::store::PriceStateStore;
use crate::alerts::structs::{AlertConfig, PriceKey, PriceState};
use crate::market::source::CandleSource;
use crate::volume_profile::structs::ProfileConfig;

use super::errors::EvaluationError;
use super::pipeline::{evaluate, EvaluationReport};

/// Monitor actor messages for telling (fire-and-forget)
#[derive(Debug, Clone)]
pub enum MonitorTell {
    /// Evaluate a key and deliver any alerts to `target`
    Evaluate { key: PriceKey, target: String },
    /// Drop the stored price for a key (e.g. on unsubscribe)
    Evict { key: PriceKey },
}

/// Monitor actor messages for asking (request-response)
#[derive(Debug, Clone)]
pub enum MonitorAsk {
    /// Evaluate a key, deliver alerts to `target` and return the report
    Evaluate { key: PriceKey, target: String },
    GetPriceState { key: PriceKey },
    GetStatistics,
}

/// Monitor actor responses
#[derive(Debug, Clone)]
pub enum MonitorReply {
    Evaluation(Box<EvaluationReport>),
    PriceState(Option<PriceState>),
    Statistics(MonitorStatistics),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatistics {
    pub evaluations: u64,
    pub failed_evaluations: u64,
    pub alerts_emitted: u64,
    pub tracked_keys: usize,
    pub last_error: Option<String>,
}

/// Owns the candle source and the level-crossing state for every tracked key.
///
/// The mailbox processes one message at a time, so successive prices for the same
/// key are always classified in the order they were requested.
pub struct MonitorActor {
    source: Box<dyn CandleSource>,
    detector: LevelCrossingDetector,
    profile_config: ProfileConfig,
    extra_lookback: usize,
    sink: Arc<dyn AlertSink>,
    evaluations: u64,
    failed_evaluations: u64,
    alerts_emitted: u64,
    last_error: Option<EvaluationError>,
}

impl MonitorActor {
    pub fn new(
        source: Box<dyn CandleSource>,
        alert_config: AlertConfig,
        profile_config: ProfileConfig,
        extra_lookback: usize,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            source,
            detector: LevelCrossingDetector::new(alert_config, PriceStateStore::new()),
            profile_config,
            extra_lookback,
            sink,
            evaluations: 0,
            failed_evaluations: 0,
            alerts_emitted: 0,
            last_error: None,
        }
    }

    async fn run_evaluation(
        &mut self,
        key: &PriceKey,
        target: &str,
    ) -> Result<EvaluationReport, EvaluationError> {
        let settings = self.profile_config.resolve_for_interval(key.interval);
        let result = evaluate(
            self.source.as_mut(),
            &mut self.detector,
            &settings,
            self.extra_lookback,
            key,
        )
        .await;

        match result {
            Ok(report) => {
                self.evaluations += 1;
                for event in &report.events {
                    self.sink.deliver(target, event);
                }
                self.alerts_emitted += report.events.len() as u64;
                Ok(report)
            }
            Err(e) => {
                self.failed_evaluations += 1;
                if e.is_transient() {
                    warn!("⚠️ Evaluation of {} failed, will retry next tick: {}", key, e);
                } else {
                    error!("❌ Evaluation of {} failed: {}", key, e);
                }
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn get_statistics(&self) -> MonitorStatistics {
        MonitorStatistics {
            evaluations: self.evaluations,
            failed_evaluations: self.failed_evaluations,
            alerts_emitted: self.alerts_emitted,
            tracked_keys: self.detector.store().len(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

impl Actor for MonitorActor {
    type Mailbox = UnboundedMailbox<Self>;

    fn name() -> &'static str {
        "MonitorActor"
    }

    async fn on_start(&mut self, _actor_ref: ActorRef<Self>) -> Result<(), BoxError> {
        info!("🚀 Starting Monitor Actor (source: {})", self.source.source_name());
        info!(
            "  Window: {} candles (+{} lookback), {} levels, value area {:.1}%",
            self.profile_config.window_size,
            self.extra_lookback,
            self.profile_config.level_count,
            self.profile_config.value_area_percent
        );
        if !self.profile_config.interval_overrides.is_empty() {
            info!(
                "  Interval overrides: {:?}",
                self.profile_config.interval_overrides.keys().collect::<Vec<_>>()
            );
        }
        if !self.detector.config().enabled {
            info!("  Alerts disabled, prices are tracked only");
        }
        Ok(())
    }

    async fn on_stop(&mut self, _actor_ref: WeakActorRef<Self>, reason: ActorStopReason) -> Result<(), BoxError> {
        info!("🛑 Stopping Monitor Actor: {:?}", reason);
        let stats = self.get_statistics();
        info!("📊 Final Monitor Actor statistics:");
        info!("  Evaluations: {} ({} failed)", stats.evaluations, stats.failed_evaluations);
        info!("  Alerts emitted: {}", stats.alerts_emitted);
        info!("  Tracked keys: {}", stats.tracked_keys);
        Ok(())
    }
}

impl Message<MonitorTell> for MonitorActor {
    type Reply = ();

    async fn handle(&mut self, msg: MonitorTell, _ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            MonitorTell::Evaluate { key, target } => {
                debug!("🔄 MonitorActor received Evaluate for {}", key);
                // Failures are logged and recorded in run_evaluation
                let _ = self.run_evaluation(&key, &target).await;
            }
            MonitorTell::Evict { key } => {
                if self.detector.evict(&key) {
                    info!("🧹 Evicted price state for {}", key);
                } else {
                    debug!("No price state to evict for {}", key);
                }
            }
        }
    }
}

impl Message<MonitorAsk> for MonitorActor {
    type Reply = Result<MonitorReply, EvaluationError>;

    async fn handle(&mut self, msg: MonitorAsk, _ctx: Context<'_, Self, Self::Reply>) -> Self::Reply {
        match msg {
            MonitorAsk::Evaluate { key, target } => {
                let report = self.run_evaluation(&key, &target).await?;
                Ok(MonitorReply::Evaluation(Box::new(report)))
            }
            MonitorAsk::GetPriceState { key } => {
                Ok(MonitorReply::PriceState(self.detector.state(&key).cloned()))
            }
            MonitorAsk::GetStatistics => Ok(MonitorReply::Statistics(self.get_statistics())),
        }
    }
}
