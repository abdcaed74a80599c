//! Error types for the CLI application.

use crate::config::ConfigError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API key variable is unset
    #[error("Environment variable {0} is not set")]
    MissingApiKey(String),

    /// Generative service client could not be built
    #[error("LLM client error")]
    Llm(#[from] parsewright_llm::LlmError),

    /// Sandbox could not be built
    #[error(transparent)]
    Sandbox(#[from] parsewright_sandbox::SandboxConfigError),

    /// Fallback extractor error
    #[error("Fallback extractor failed")]
    Fallback(#[from] parsewright_fallback::FallbackError),

    /// Profile or artifact store error
    #[error("Store error")]
    Store(#[from] parsewright_store::StoreError),

    /// Run could not be evaluated
    #[error("Run failed")]
    Agent(#[from] parsewright_agent::AgentError),

    /// Serialization error
    #[error("Serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// The run was cancelled with Ctrl-C
    #[error("Interrupted")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsewright_store::StoreError;

    fn chain(err: CliError) -> Vec<String> {
        anyhow::Error::from(err).chain().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_wrapped_cause_reported_once() {
        let messages = chain(CliError::from(StoreError::NotFound(
            "no artifact for profile 'icici'".to_string(),
        )));
        assert_eq!(messages[0], "Store error");
        assert_eq!(messages.iter().filter(|m| m.contains("no artifact")).count(), 1);
    }

    #[test]
    fn test_serialization_cause_reported_once() {
        let source = serde_json::from_str::<u8>("not json").unwrap_err();
        let detail = source.to_string();
        let messages = chain(CliError::from(source));
        assert_eq!(messages, vec!["Serialization failed".to_string(), detail]);
    }
}
