//! Configuration file handling.
//!
//! The file is looked up in this order: `--config`, `./parsewright.toml`,
//! `<config dir>/parsewright/config.toml`. Without a file the defaults apply.

use parsewright_agent::AgentConfig;
use parsewright_fallback::ReaderConfig;
use parsewright_sandbox::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "parsewright.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("Invalid [{section}] configuration: {message}")]
    Invalid {
        /// Offending section
        section: &'static str,
        /// What is wrong
        message: String,
    },
}

/// Generative service kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (Groq by default)
    Groq,
    /// Local Ollama server
    Ollama,
}

/// `[llm]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Service kind
    pub provider: ProviderKind,

    /// Service endpoint, provider default when absent
    pub endpoint: Option<String>,

    /// Model name, provider default when absent
    pub model: Option<String>,

    /// Sampling temperature, overrides `[agent]`
    pub temperature: Option<f32>,

    /// Request timeout (seconds), overrides `[agent]`
    pub request_timeout_secs: Option<u64>,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Groq,
            endpoint: None,
            model: None,
            temperature: None,
            request_timeout_secs: None,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Profiles with sample documents and ground truth
    pub data_dir: PathBuf,

    /// Persisted parsers
    pub artifacts_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}

/// Full CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Generation loop
    pub agent: AgentConfig,

    /// Generative service
    pub llm: LlmSettings,

    /// Candidate execution
    pub sandbox: SandboxConfig,

    /// Document reading
    pub reader: ReaderConfig,

    /// Directories
    pub paths: PathSettings,
}

impl Config {
    /// Load the first configuration file found, or the defaults.
    ///
    /// Returns the configuration and the file it came from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::candidates().into_iter().find(|p| p.is_file()),
        };

        let config = match &path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok((config, path))
    }

    /// Default lookup locations, in order.
    pub fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("parsewright").join("config.toml"));
        }
        paths
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent_config()
            .validate()
            .map_err(|message| ConfigError::Invalid { section: "agent", message })?;
        self.sandbox.validate().map_err(|e| ConfigError::Invalid {
            section: "sandbox",
            message: e.0,
        })?;
        self.reader
            .validate()
            .map_err(|message| ConfigError::Invalid { section: "reader", message })?;
        if self.llm.api_key_env.trim().is_empty() && self.llm.provider == ProviderKind::Groq {
            return Err(ConfigError::Invalid {
                section: "llm",
                message: "api_key_env must name an environment variable".to_string(),
            });
        }
        Ok(())
    }

    /// Agent configuration with the `[llm]` overrides applied.
    pub fn agent_config(&self) -> AgentConfig {
        let mut agent = self.agent.clone();
        if let Some(temperature) = self.llm.temperature {
            agent.temperature = temperature;
        }
        if let Some(secs) = self.llm.request_timeout_secs {
            agent.request_timeout_secs = secs;
        }
        agent
    }
}
