/// Level-crossing alerts
///
/// Compares successive prices of a symbol/interval against the POC, VAH and VAL of
/// the freshly computed volume profile and emits discrete transition events.
pub mod detector;
pub mod sink;
pub mod store;
pub mod structs;

pub use detector::{classify, LevelCrossingDetector};
pub use sink::{AlertSink, ChannelAlertSink, DeliveredAlert, TracingAlertSink};
pub use store::PriceStateStore;
pub use structs::{
    AlertConfig, AlertEvent, AlertKind, AlertToggle, Direction, PocTouchConfig, PriceKey, PriceState,
};
