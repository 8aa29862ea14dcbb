use thiserror::Error;

/// Main error type for the signal bot
#[derive(Error, Debug)]
pub enum SignalError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Feed errors
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Invalid feed payload: {0}")]
    InvalidFeedPayload(String),

    #[error("Unrecognized outcome label: {0}")]
    UnrecognizedOutcome(String),

    // Sink errors
    #[error("Notification failed: {0}")]
    Notification(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SignalError
pub type Result<T> = std::result::Result<T, SignalError>;

impl SignalError {
    /// Transient errors end the current tick early; the next tick retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SignalError::Http(_)
                | SignalError::Json(_)
                | SignalError::FeedUnavailable(_)
                | SignalError::InvalidFeedPayload(_)
                | SignalError::Notification(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SignalError::FeedUnavailable("503".into()).is_transient());
        assert!(SignalError::InvalidFeedPayload("missing id".into()).is_transient());
        let malformed = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(SignalError::from(malformed).is_transient());
        assert!(!SignalError::Validation("bad".into()).is_transient());
        assert!(!SignalError::UnrecognizedOutcome("???".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = SignalError::UnrecognizedOutcome("Suited Tie".into());
        assert_eq!(err.to_string(), "Unrecognized outcome label: Suited Tie");
    }
}
