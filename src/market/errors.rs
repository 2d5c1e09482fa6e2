use thiserror::Error;

/// Failures of a candle source. Every variant means "data unavailable":
/// callers propagate them and never fabricate a profile in their place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No data found: {0}")]
    NoData(String),
}
