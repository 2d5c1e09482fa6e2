use kameo::error::SendError;
use thiserror::Error;

use crate::market::errors::MarketDataError;
use crate::volume_profile::errors::ProfileError;

/// Failure of one evaluation tick. The two sources stay distinguishable so the
/// caller can tell missing data from a misconfigured window.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Candle source failed: {0}")]
    DataUnavailable(#[from] MarketDataError),

    #[error("Profile calculation failed: {0}")]
    Profile(#[from] ProfileError),

    /// The monitor could not be reached or stopped before replying
    #[error("Actor error: {0}")]
    Actor(String),
}

impl<M> From<SendError<M, EvaluationError>> for EvaluationError {
    fn from(error: SendError<M, EvaluationError>) -> Self {
        match error {
            SendError::HandlerError(e) => e,
            other => EvaluationError::Actor(other.to_string()),
        }
    }
}

impl EvaluationError {
    /// True when retrying later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EvaluationError::DataUnavailable(
                MarketDataError::Network(_) | MarketDataError::RateLimit(_) | MarketDataError::Http(_)
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_keeps_source_kind() {
        let error: EvaluationError = ProfileError::InsufficientData {
            required: 150,
            available: 20,
        }
        .into();
        assert!(matches!(
            error,
            EvaluationError::Profile(ProfileError::InsufficientData { required: 150, available: 20 })
        ));
        assert!(!error.is_transient());

        let error: EvaluationError = MarketDataError::Network("timeout".to_string()).into();
        assert!(error.is_transient());
        assert_eq!(error.to_string(), "Candle source failed: Network error: timeout");
    }

    #[test]
    fn test_send_error_conversion() {
        let handler: SendError<(), EvaluationError> =
            SendError::HandlerError(MarketDataError::RateLimit("slow down".to_string()).into());
        let error: EvaluationError = handler.into();
        assert!(matches!(
            error,
            EvaluationError::DataUnavailable(MarketDataError::RateLimit(_))
        ));
        assert!(error.is_transient());

        let stopped: SendError<(), EvaluationError> = SendError::ActorStopped;
        let error: EvaluationError = stopped.into();
        assert_eq!(error, EvaluationError::Actor("actor stopped".to_string()));
        assert!(!error.is_transient());

        let not_running: SendError<(), EvaluationError> = SendError::ActorNotRunning(());
        assert_eq!(
            EvaluationError::from(not_running).to_string(),
            "Actor error: actor not running"
        );
    }
}
