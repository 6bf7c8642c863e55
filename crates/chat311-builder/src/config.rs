//! Configuration for the RequestBuilder

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a request's latitude/longitude come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateStrategy {
    /// Look up the derived location with a geocoding service; failures
    /// leave the coordinates unset
    #[default]
    Geocoder,
    /// Ask the model for "latitude, longitude"; a malformed answer aborts
    Model,
}

/// How the model's category answer is checked against the category list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMode {
    /// Store whatever the model answered
    #[default]
    Accept,
    /// Store the canonical list entry, or `Other` when there is none
    Strict,
}

/// Configuration for the RequestBuilder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Completion model name
    pub model: String,

    /// Model context window; each call's token budget is this minus the
    /// prompt length
    pub context_window: u32,

    /// Coordinate derivation strategy
    pub coordinate_strategy: CoordinateStrategy,

    /// Category validation policy
    pub category_mode: CategoryMode,

    /// Issue the four independent text steps concurrently
    ///
    /// The first failure fails the build at once, but sibling calls already
    /// handed to the blocking pool cannot be recalled: they run to the end
    /// and their answers are discarded. Calls that have not started yet are
    /// skipped.
    pub parallel_steps: bool,

    /// Sampling temperature passed to the completion service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Transport timeout for each outbound call (seconds)
    pub request_timeout_secs: u64,
}

impl BuilderConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.context_window == 0 {
            return Err("context_window must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be within 0.0..=2.0, got {}", t));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str)
            .map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-instruct".to_string(),
            context_window: 4097,
            coordinate_strategy: CoordinateStrategy::default(),
            category_mode: CategoryMode::default(),
            parallel_steps: false,
            temperature: None,
            request_timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_defaults() {
        assert_eq!(CoordinateStrategy::default(), CoordinateStrategy::Geocoder);
        assert_eq!(CategoryMode::default(), CategoryMode::Accept);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BuilderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context_window, 4097);
        assert_eq!(config.coordinate_strategy, CoordinateStrategy::Geocoder);
        assert_eq!(config.category_mode, CategoryMode::Accept);
    }

    #[test]
    fn test_invalid_context_window() {
        let config = BuilderConfig {
            context_window: 0,
            ..BuilderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_temperature() {
        let config = BuilderConfig {
            temperature: Some(3.5),
            ..BuilderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BuilderConfig::from_toml(
            r#"
            coordinate_strategy = "model"
            category_mode = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.coordinate_strategy, CoordinateStrategy::Model);
        assert_eq!(config.category_mode, CategoryMode::Strict);
        assert_eq!(config.context_window, 4097);
        assert!(!config.parallel_steps);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(BuilderConfig::from_toml(r#"coordinate_strategy = "astrology""#).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BuilderConfig {
            temperature: Some(0.2),
            parallel_steps: true,
            ..BuilderConfig::default()
        };
        let parsed = BuilderConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
