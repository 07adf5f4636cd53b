//! Error types for the POISE runtime

use poise_core::{Modality, PoiseError};
use thiserror::Error;

/// Landmark provider failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{modality} provider unavailable: {reason}")]
    Unavailable { modality: Modality, reason: String },

    #[error("{modality} provider rejected options: {reason}")]
    InvalidOptions { modality: Modality, reason: String },

    #[error("{modality} inference rejected: {reason}")]
    Rejected { modality: Modality, reason: String },
}

impl ProviderError {
    pub fn modality(&self) -> Modality {
        match self {
            ProviderError::Unavailable { modality, .. }
            | ProviderError::InvalidOptions { modality, .. }
            | ProviderError::Rejected { modality, .. } => *modality,
        }
    }
}

/// Frame source failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Frame source unavailable: {0}")]
    Unavailable(String),

    #[error("Frame source permission denied")]
    PermissionDenied,
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] PoiseError),
}

/// Session lifecycle failures
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session must be started inside a Tokio runtime")]
    NoRuntime,

    #[error("Invalid config: {0}")]
    Config(#[from] PoiseError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("More than one {0} provider registered")]
    DuplicateProvider(Modality),

    #[error("Frame loop failed: {0}")]
    LoopFailed(String),
}

/// Logging setup failures
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log directive: {0}")]
    Directive(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Rejected {
            modality: Modality::Hands,
            reason: "model busy".into(),
        };
        assert_eq!(err.to_string(), "hands inference rejected: model busy");
        assert_eq!(err.modality(), Modality::Hands);
    }

    #[test]
    fn test_session_error_from_source() {
        let err: SessionError = SourceError::PermissionDenied.into();
        assert_eq!(err.to_string(), "Frame source permission denied");
    }
}
