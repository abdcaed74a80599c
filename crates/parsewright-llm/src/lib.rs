//! Parsewright LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `parsewright-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted provider for testing
//! - `ChatProvider`: OpenAI-compatible chat completions (Groq by default)
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use parsewright_domain::traits::{CompletionRequest, LlmProvider};
//! use parsewright_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("print('hello')");
//! let request = CompletionRequest {
//!     system: String::new(),
//!     prompt: "write a parser".to_string(),
//!     temperature: 0.1,
//! };
//! assert_eq!(provider.complete(&request).await.unwrap(), "print('hello')");
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod ollama;

use parsewright_domain::traits::{CompletionRequest, LlmProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use chat::ChatProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// One scripted reply of a [`MockProvider`]
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text
    Text(String),

    /// Fail with `LlmError::Other`
    Error(String),

    /// Wait, then return this text (for exercising request timeouts)
    Delayed(Duration, String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    requests: Vec<CompletionRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are consumed in order from a script; once the script is empty the
/// default response is returned. Every request is recorded so tests can
/// inspect the prompts that were sent.
///
/// # Examples
///
/// ```
/// use parsewright_llm::{MockProvider, MockReply};
///
/// let provider = MockProvider::new("fallback text")
///     .with_reply(MockReply::Text("first".to_string()))
///     .with_reply(MockReply::Error("quota".to_string()));
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a MockProvider that plays `replies` in order
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let provider = Self::default();
        provider.lock().script.extend(replies);
        provider
    }

    /// Append a reply to the script
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.lock().script.push_back(reply);
        self
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded requests
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            state.script.pop_front()
        };

        match reply {
            None => Ok(self.default_response.clone()),
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(msg)) => Err(LlmError::Other(msg)),
            Some(MockReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
