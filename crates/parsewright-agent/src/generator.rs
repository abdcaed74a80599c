//! Candidate generation through a code-completion service

use crate::config::AgentConfig;
use crate::error::GenerationError;
use crate::prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
use crate::response::extract_source;
use parsewright_domain::traits::{CompletionRequest, LlmProvider};
use parsewright_domain::{FeedbackHistory, ProfileId, TabularResult};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Produces candidate source for a profile from the full feedback history
pub struct CandidateGenerator<L: LlmProvider> {
    provider: L,
    request_timeout: Duration,
    temperature: f32,
    preview_rows: usize,
    language: String,
}

impl<L: LlmProvider> CandidateGenerator<L> {
    /// Create a generator around a provider
    pub fn new(provider: L, config: &AgentConfig) -> Self {
        Self {
            provider,
            request_timeout: config.request_timeout(),
            temperature: config.temperature,
            preview_rows: config.preview_rows,
            language: config.language.clone(),
        }
    }

    /// Model name of the underlying provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Request one candidate
    ///
    /// The reply is untrusted text; only a surrounding code fence is removed.
    pub async fn generate(
        &self,
        profile: &ProfileId,
        ground_truth: &TabularResult,
        excerpt: Option<&str>,
        history: &FeedbackHistory,
    ) -> Result<String, GenerationError> {
        let prompt = PromptBuilder::new(profile, ground_truth, history)
            .with_language(&self.language)
            .with_preview_rows(self.preview_rows)
            .with_excerpt(excerpt)
            .build();

        debug!(
            profile = %profile,
            prompt_chars = prompt.len(),
            feedback = history.len(),
            "requesting candidate"
        );

        let request = CompletionRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt,
            temperature: self.temperature,
        };

        let response = timeout(self.request_timeout, self.provider.complete(&request))
            .await
            .map_err(|_| GenerationError::Timeout(self.request_timeout))?
            .map_err(|e| GenerationError::Service(e.to_string()))?;

        debug!(response_chars = response.len(), "candidate received");
        Ok(extract_source(&response))
    }
}
