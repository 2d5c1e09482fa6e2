use tokio::sync::mpsc;
use tracing::{debug, info};

use super::structs::{AlertEvent, AlertKind};

/// Consumer of alert events. Delivery is fire-and-forget: failures are the
/// sink's own business and never reach the detector.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, target: &str, event: &AlertEvent);

    fn sink_name(&self) -> &'static str;
}

/// Writes every alert to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn deliver(&self, target: &str, event: &AlertEvent) {
        let icon = match event.kind {
            AlertKind::PocTouch { .. } => "🎯",
            AlertKind::VahBreakout { .. } => "🚀",
            AlertKind::ValBreakdown { .. } => "📉",
            AlertKind::EnteredValueArea { .. } => "📥",
            AlertKind::LeftValueArea { .. } => "📤",
        };
        info!(target: "frvp_alerts::alerts", "{} [{}] {}", icon, target, event);
    }

    fn sink_name(&self) -> &'static str {
        "tracing"
    }
}

/// Alert handed to a [`ChannelAlertSink`] receiver
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredAlert {
    pub target: String,
    pub event: AlertEvent,
}

/// Forwards alerts to an unbounded channel, e.g. for a chat bot task
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::UnboundedSender<DeliveredAlert>,
}

impl ChannelAlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveredAlert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelAlertSink {
    fn deliver(&self, target: &str, event: &AlertEvent) {
        let delivered = DeliveredAlert {
            target: target.to_string(),
            event: event.clone(),
        };
        if self.sender.send(delivered).is_err() {
            debug!("Alert receiver dropped, discarding {} for {}", event.kind.name(), target);
        }
    }

    fn sink_name(&self) -> &'static str {
        "channel"
    }
}
