/// Fixed-Range Volume Profile
///
/// Turns a fixed window of candles into a price histogram using body/wick volume
/// decomposition, and derives the Point of Control and the Value Area bounds.
pub mod calculator;
pub mod errors;
pub mod position;
pub mod structs;

pub use calculator::{compute, overlap, CandleVolumeSplit};
pub use errors::ProfileError;
pub use position::{LevelDistances, MarketPosition, PriceAnalysis};
pub use structs::{IntervalOverride, ProfileConfig, ProfileSettings, VolumeProfile};
