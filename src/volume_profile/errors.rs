use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Insufficient data: window needs {required} candles, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("Invalid profile settings: {0}")]
    InvalidSettings(String),
}
