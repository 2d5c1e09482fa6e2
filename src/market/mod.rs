/// Market data: candle model, the candle source seam and its implementations
pub mod binance;
pub mod errors;
pub mod source;
pub mod structs;

pub use binance::BinanceKlinesClient;
pub use errors::MarketDataError;
pub use source::{CandleSource, MemoryCandleSource};
pub use structs::{Candle, Interval, TimestampMS};
