//! Configuration for the sandbox

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Invalid sandbox configuration
#[derive(Debug, Error, PartialEq)]
#[error("Invalid sandbox configuration: {0}")]
pub struct SandboxConfigError(pub String);

/// Configuration for [`SubprocessSandbox`](crate::SubprocessSandbox)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter command line; the script and document paths are appended
    pub interpreter: Vec<String>,

    /// Extension candidate scripts are written with
    pub script_extension: String,

    /// Wall-clock limit for one execution (seconds)
    pub timeout_secs: u64,

    /// Maximum bytes accepted on stdout
    pub max_output_bytes: usize,

    /// Environment variables passed through from the parent, besides `PATH`
    pub env_allowlist: Vec<String>,
}

impl SandboxConfig {
    /// Get the execution timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SandboxConfigError> {
        match self.interpreter.first() {
            None => return Err(SandboxConfigError("interpreter must not be empty".to_string())),
            Some(program) if program.trim().is_empty() => {
                return Err(SandboxConfigError("interpreter program must not be blank".to_string()))
            }
            Some(_) => {}
        }
        if self.script_extension.is_empty()
            || !self.script_extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SandboxConfigError(format!(
                "script_extension '{}' must be non-empty and alphanumeric",
                self.script_extension
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SandboxConfigError("timeout_secs must be greater than 0".to_string()));
        }
        if self.max_output_bytes == 0 {
            return Err(SandboxConfigError("max_output_bytes must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["python3".to_string()],
            script_extension: "py".to_string(),
            timeout_secs: 60,
            max_output_bytes: 8 * 1024 * 1024,
            env_allowlist: vec!["VIRTUAL_ENV".to_string(), "PYTHONPATH".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SandboxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_empty_interpreter_rejected() {
        let config = SandboxConfig {
            interpreter: vec![],
            ..SandboxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_extension_rejected() {
        let config = SandboxConfig {
            script_extension: "../py".to_string(),
            ..SandboxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SandboxConfig {
            timeout_secs: 0,
            ..SandboxConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SandboxConfig::from_toml("interpreter = [\"uv\", \"run\", \"python\"]\ntimeout_secs = 10").unwrap();
        assert_eq!(config.interpreter, vec!["uv", "run", "python"]);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.script_extension, "py");
    }
}
