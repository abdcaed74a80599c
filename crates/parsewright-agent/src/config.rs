//! Configuration for the generation loop

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`Orchestrator`](crate::Orchestrator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Generation attempts before the fallback runs
    pub max_attempts: u32,

    /// Maximum time for a single generation request (seconds)
    pub request_timeout_secs: u64,

    /// Sampling temperature for generation requests
    pub temperature: f32,

    /// Ground-truth rows shown in the prompt
    pub preview_rows: usize,

    /// Characters of sample-document text shown in the prompt (0 disables)
    pub excerpt_chars: usize,

    /// Language the candidate must be written in, as named in the prompt
    pub language: String,
}

impl AgentConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} is outside [0.0, 2.0]", self.temperature));
        }
        if self.language.trim().is_empty() {
            return Err("language must not be empty".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout_secs: 120,
            temperature: 0.1,
            preview_rows: 5,
            excerpt_chars: 4_000,
            language: "Python 3".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = AgentConfig {
            max_attempts: 0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_bounds() {
        let config = AgentConfig {
            temperature: 3.5,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = AgentConfig::from_toml("max_attempts = 5").unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.request_timeout_secs, 120);
    }
}
