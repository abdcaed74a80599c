//! Generative service selection from configuration.

use crate::config::{LlmSettings, ProviderKind};
use crate::error::{CliError, Result};
use parsewright_domain::traits::{CompletionRequest, LlmProvider};
use parsewright_llm::{chat, ollama, ChatProvider, LlmError, OllamaProvider};
use std::time::Duration;

/// The configured generative service.
pub enum Provider {
    /// OpenAI-compatible chat completions
    Chat(ChatProvider),
    /// Local Ollama server
    Ollama(OllamaProvider),
}

impl Provider {
    /// Build the provider named in `[llm]`.
    ///
    /// The API key is read from the environment only for chat providers.
    pub fn from_settings(settings: &LlmSettings, timeout: Duration) -> Result<Self> {
        match settings.provider {
            ProviderKind::Groq => {
                let api_key = std::env::var(&settings.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| CliError::MissingApiKey(settings.api_key_env.clone()))?;
                let provider = ChatProvider::new(
                    settings.endpoint.as_deref().unwrap_or(chat::DEFAULT_ENDPOINT),
                    settings.model.as_deref().unwrap_or(chat::DEFAULT_MODEL),
                    api_key,
                    timeout,
                )?;
                Ok(Provider::Chat(provider))
            }
            ProviderKind::Ollama => {
                let model = settings.model.as_deref().ok_or_else(|| {
                    CliError::InvalidInput("[llm] model is required for the ollama provider".to_string())
                })?;
                let provider = OllamaProvider::with_timeout(
                    settings.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT),
                    model,
                    timeout,
                )?;
                Ok(Provider::Ollama(provider))
            }
        }
    }
}

impl LlmProvider for Provider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, Self::Error> {
        match self {
            Provider::Chat(provider) => provider.complete(request).await,
            Provider::Ollama(provider) => provider.complete(request).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Provider::Chat(provider) => provider.model_name(),
            Provider::Ollama(provider) => provider.model_name(),
        }
    }
}
