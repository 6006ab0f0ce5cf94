//! Engine configuration and its invariants.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{
    CRITICAL_THRESHOLD, DEFAULT_INDICATORS, FAILURE_THRESHOLD, INDICATOR_MAX, INDICATOR_MIN,
    INITIAL_INDICATOR_VALUE,
};
use crate::result::ScoreBands;

/// Rule parameters for a run. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Indicator names in display order.
    #[serde(default = "EngineConfig::default_indicators")]
    pub indicators: Vec<String>,
    #[serde(default = "EngineConfig::default_initial_value")]
    pub initial_value: i32,
    #[serde(default = "EngineConfig::default_critical_threshold")]
    pub critical_threshold: i32,
    #[serde(default = "EngineConfig::default_failure_threshold")]
    pub failure_threshold: i32,
    #[serde(default)]
    pub score: ScoreBands,
}

impl EngineConfig {
    fn default_indicators() -> Vec<String> {
        DEFAULT_INDICATORS.iter().map(ToString::to_string).collect()
    }

    const fn default_initial_value() -> i32 {
        INITIAL_INDICATOR_VALUE
    }

    const fn default_critical_threshold() -> i32 {
        CRITICAL_THRESHOLD
    }

    const fn default_failure_threshold() -> i32 {
        FAILURE_THRESHOLD
    }

    /// Parse a configuration document and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values break an invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indicators.is_empty() {
            return Err(ConfigError::NoIndicators);
        }
        let mut seen = HashSet::new();
        for name in &self.indicators {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankIndicator);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateIndicator { name: name.clone() });
            }
        }
        for (field, value) in [
            ("initial_value", self.initial_value),
            ("critical_threshold", self.critical_threshold),
            ("failure_threshold", self.failure_threshold),
        ] {
            if !(INDICATOR_MIN..=INDICATOR_MAX).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: INDICATOR_MIN,
                    max: INDICATOR_MAX,
                });
            }
        }
        if self.failure_threshold > self.critical_threshold {
            return Err(ConfigError::ThresholdOrder {
                failure: self.failure_threshold,
                critical: self.critical_threshold,
            });
        }
        let bands = &self.score;
        if !(bands.excellent_min >= bands.good_min && bands.good_min >= bands.regular_min) {
            return Err(ConfigError::ScoreBands {
                excellent: bands.excellent_min,
                good: bands.good_min,
                regular: bands.regular_min,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indicators: Self::default_indicators(),
            initial_value: INITIAL_INDICATOR_VALUE,
            critical_threshold: CRITICAL_THRESHOLD,
            failure_threshold: FAILURE_THRESHOLD,
            score: ScoreBands::default(),
        }
    }
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("at least one indicator is required")]
    NoIndicators,
    #[error("indicator names must not be blank")]
    BlankIndicator,
    #[error("indicator `{name}` is listed more than once")]
    DuplicateIndicator { name: String },
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
    #[error("failure threshold {failure} exceeds critical threshold {critical}")]
    ThresholdOrder { failure: i32, critical: i32 },
    #[error(
        "score bands must descend: excellent {excellent:.1}, good {good:.1}, regular {regular:.1}"
    )]
    ScoreBands {
        excellent: f64,
        good: f64,
        regular: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indicators.len(), 5);
        assert_eq!(config.initial_value, 50);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config =
            EngineConfig::from_json(r#"{ "indicators": ["Cash", "Trust"], "initial_value": 60 }"#)
                .unwrap();
        assert_eq!(config.indicators, vec!["Cash", "Trust"]);
        assert_eq!(config.initial_value, 60);
        assert_eq!(config.critical_threshold, CRITICAL_THRESHOLD);
    }

    #[test]
    fn rejects_broken_invariants() {
        let cases = [
            r#"{ "indicators": [] }"#,
            r#"{ "indicators": ["A", " "] }"#,
            r#"{ "indicators": ["A", "A"] }"#,
            r#"{ "initial_value": 101 }"#,
            r#"{ "failure_threshold": 30 }"#,
            r#"{ "score": { "good_min": 80 } }"#,
            "not json",
        ];
        for json in cases {
            assert!(EngineConfig::from_json(json).is_err(), "accepted {json}");
        }
        assert!(matches!(
            EngineConfig::from_json(r#"{ "indicators": ["A", "A"] }"#),
            Err(ConfigError::DuplicateIndicator { .. })
        ));
    }
}
