//! OpenAI-compatible chat completions provider
//!
//! Works with any service exposing `POST {endpoint}/chat/completions` with
//! bearer authentication. The defaults target Groq.

use crate::LlmError;
use parsewright_domain::traits::{CompletionRequest, LlmProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default endpoint (Groq's OpenAI-compatible API)
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default HTTP timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat completions provider
pub struct ChatProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider {
    /// Create a provider
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use parsewright_llm::ChatProvider;
    /// use std::time::Duration;
    ///
    /// let provider = ChatProvider::new(
    ///     "https://api.groq.com/openai/v1",
    ///     "llama-3.1-8b-instant",
    ///     "gsk_...",
    ///     Duration::from_secs(60),
    /// ).unwrap();
    /// ```
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
        })
    }

    /// Create a provider for Groq with the default model
    pub fn groq(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(
            DEFAULT_ENDPOINT,
            DEFAULT_MODEL,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

fn map_status(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Unauthorized(body),
        404 => LlmError::ModelNotAvailable(model.to_string()),
        429 => LlmError::RateLimitExceeded,
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

fn first_choice(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response contains no message content".to_string()))
}

impl LlmProvider for ChatProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, text, &self.model));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        let content = first_choice(parsed)?;
        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_key() {
        let result = ChatProvider::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, "  ", Duration::from_secs(1));
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_url_joins_endpoint() {
        let provider = ChatProvider::new("http://localhost:8000/v1/", "m", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_groq_defaults() {
        let provider = ChatProvider::groq("key").unwrap();
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_status_mapping() {
        let status = |code| reqwest::StatusCode::from_u16(code).unwrap();
        assert!(matches!(map_status(status(429), String::new(), "m"), LlmError::RateLimitExceeded));
        assert!(matches!(map_status(status(401), String::new(), "m"), LlmError::Unauthorized(_)));
        assert!(matches!(map_status(status(404), String::new(), "m"), LlmError::ModelNotAvailable(_)));
        assert!(matches!(map_status(status(500), "oops".to_string(), "m"), LlmError::Communication(msg) if msg.contains("oops")));
    }

    #[test]
    fn test_parse_response() {
        let json = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"import sys"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_choice(parsed).unwrap(), "import sys");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
            temperature: 0.1,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
    }
}
