//! Error types for POISE core

use thiserror::Error;

/// Core POISE errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoiseError {
    // Configuration errors
    #[error("Invalid threshold `{name}`: {value} (must be finite and positive)")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("Invalid duration `{name}`: must be non-zero")]
    ZeroDuration { name: &'static str },

    #[error("Invalid band `{name}`: lower bound {low} must be below upper bound {high}")]
    InvalidBand { name: &'static str, low: f32, high: f32 },
}

impl PoiseError {
    /// Check that a threshold is finite and strictly positive
    pub fn check_threshold(name: &'static str, value: f32) -> PoiseResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(PoiseError::InvalidThreshold { name, value })
        }
    }

    /// Check that `low < high` and both bounds are valid thresholds
    pub fn check_band(name: &'static str, low: f32, high: f32) -> PoiseResult<()> {
        Self::check_threshold(name, low)?;
        Self::check_threshold(name, high)?;
        if low < high {
            Ok(())
        } else {
            Err(PoiseError::InvalidBand { name, low, high })
        }
    }

    /// Check that a duration is non-zero
    pub fn check_duration(name: &'static str, value: std::time::Duration) -> PoiseResult<()> {
        if value.is_zero() {
            Err(PoiseError::ZeroDuration { name })
        } else {
            Ok(())
        }
    }
}

/// Result type for POISE operations
pub type PoiseResult<T> = Result<T, PoiseError>;
