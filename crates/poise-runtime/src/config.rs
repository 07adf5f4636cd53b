//! Session configuration
//!
//! Every field has a default, so `{}` is a complete config. Durations are
//! written as human strings such as `"16ms"` or `"3s"`.

use std::path::Path;
use std::time::Duration;

use poise_core::{duration_format, PoiseError, PoiseResult};
use poise_feedback::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ProvidersConfig, TelemetryConfig};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame loop period
    #[serde(with = "duration_format")]
    pub tick_interval: Duration,
    pub engine: EngineConfig,
    pub providers: ProvidersConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            engine: EngineConfig::default(),
            providers: ProvidersConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> PoiseResult<()> {
        PoiseError::check_duration("tick_interval", self.tick_interval)?;
        self.engine.validate()?;
        self.providers.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = SessionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.tick_interval, Duration::from_millis(16));
    }

    #[test]
    fn test_partial_override() {
        let config = SessionConfig::from_json_str(
            r#"{
                "tick_interval": "33ms",
                "engine": { "decay": { "ttl": "2s" } },
                "telemetry": { "level": "debug" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tick_interval, Duration::from_millis(33));
        assert_eq!(config.engine.decay.ttl, Duration::from_secs(2));
        assert_eq!(config.telemetry.level, "debug");
        assert!(config.providers.face.refine_landmarks);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = SessionConfig::from_json_str(r#"{"tick_interval":"0s"}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(PoiseError::ZeroDuration { name: "tick_interval" })
        ));
    }

    #[test]
    fn test_bad_duration_is_json_error() {
        let err = SessionConfig::from_json_str(r#"{"tick_interval":"fast"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err =
            SessionConfig::from_json_str(r#"{"engine":{"hands":{"max_energy":-1.0}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_pretty_json_reloads() {
        let config = SessionConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"16ms\""));
        assert_eq!(SessionConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::from_path("/nonexistent/poise.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
