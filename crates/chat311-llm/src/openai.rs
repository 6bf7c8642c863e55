//! OpenAI-compatible completion provider
//!
//! Talks to the legacy `/completions` endpoint: one prompt in, one block of
//! generated text out. Calls are never retried; a timeout surfaces as a
//! communication error like any other transport failure.
//!
//! # Examples
//!
//! ```no_run
//! use chat311_llm::OpenAiProvider;
//! use std::time::Duration;
//!
//! let provider = OpenAiProvider::new("sk-...", "gpt-3.5-turbo-instruct", Duration::from_secs(60))
//!     .unwrap()
//!     .with_temperature(0.0);
//! ```

use crate::LlmError;
use chat311_domain::traits::CompletionProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion provider backed by an OpenAI-compatible HTTP API
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    client: reqwest::Client,
}

/// Request body for the completions API
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from the completions API
#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

impl OpenAiProvider {
    /// Create a provider for `model` authenticated with `api_key`
    ///
    /// `timeout` bounds each HTTP exchange end to end.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            client,
        })
    }

    /// Point the provider at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete a prompt
    ///
    /// # Errors
    ///
    /// - `RateLimitExceeded` on HTTP 429
    /// - `ModelNotAvailable` on HTTP 404
    /// - `Communication` on any other failure status or transport error
    /// - `InvalidResponse` when the body carries no completion
    pub async fn complete_async(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let url = format!("{}/completions", self.base_url);

        let request_body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
            temperature: self.temperature,
        };

        debug!("POST {} (max_tokens={})", url, max_tokens);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Communication(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, body)));
        }

        parse_completion(&body)
    }
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Pull the first completion's text out of a response body
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))
}

impl CompletionProvider for OpenAiProvider {
    type Error = LlmError;

    /// Blocking wrapper over [`OpenAiProvider::complete_async`]
    ///
    /// Must run off the async worker threads (e.g. inside
    /// `tokio::task::spawn_blocking`) when a runtime is present.
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.complete_async(prompt, max_tokens)),
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?
                .block_on(self.complete_async(prompt, max_tokens)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OpenAiProvider {
        OpenAiProvider::new("test-key", "gpt-3.5-turbo-instruct", Duration::from_secs(2))
            .unwrap()
            .with_base_url(base_url)
    }

    #[test]
    fn test_provider_creation() {
        let provider = provider("http://localhost:8000/v1/");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
        assert_eq!(provider.model(), "gpt-3.5-turbo-instruct");
        assert_eq!(provider.temperature, None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", provider(DEFAULT_BASE_URL));
        assert!(!rendered.contains("test-key"));
        assert!(rendered.contains("gpt-3.5-turbo-instruct"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = CompletionRequest {
            model: "m",
            prompt: "p",
            max_tokens: 97,
            temperature: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 97);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_completion_first_choice() {
        let body = r#"{"choices":[{"text":"\n\npotholes","index":0},{"text":"other"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "\n\npotholes");
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let result = parse_completion(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_completion_garbage() {
        let result = parse_completion("<html>bad gateway</html>");
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let provider = provider("http://127.0.0.1:1/v1");
        let result = provider.complete_async("test", 10).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }

    #[test]
    fn test_blocking_wrapper_without_runtime() {
        let provider = provider("http://127.0.0.1:1/v1");
        let result = provider.complete("test", 10);
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
