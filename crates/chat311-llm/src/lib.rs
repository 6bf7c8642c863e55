//! Chat311 Completion Provider Layer
//!
//! Implementations of the `CompletionProvider` trait from `chat311-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible `/completions` endpoint
//!
//! # Examples
//!
//! ```
//! use chat311_llm::MockProvider;
//! use chat311_domain::traits::CompletionProvider;
//!
//! let provider = MockProvider::new("potholes");
//! let result = provider.complete("test prompt", 16).unwrap();
//! assert_eq!(result, "potholes");
//! ```

#![warn(missing_docs)]

pub mod openai;

use chat311_domain::traits::CompletionProvider;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during completion calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error, including timeouts
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the completion service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// One recorded call to a [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Prompt text as received
    pub prompt: String,
    /// Token budget as received
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

/// Mock completion provider for deterministic testing
///
/// Replies are chosen in this order: queued replies (FIFO), then the first
/// rule whose fragment occurs in the prompt, then the default response.
///
/// # Examples
///
/// ```
/// use chat311_llm::MockProvider;
/// use chat311_domain::traits::CompletionProvider;
///
/// let mut provider = MockProvider::new("fallback");
/// provider.add_response("severity", "High");
/// assert_eq!(provider.complete("print the severity", 10).unwrap(), "High");
/// assert_eq!(provider.complete("anything else", 10).unwrap(), "fallback");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    queue: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `response` to any prompt containing `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail any prompt containing `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        lock(&self.rules).push((fragment.into(), MockReply::Error));
    }

    /// Queue a one-shot reply used before any rule
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(response.into());
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Forget recorded calls
    pub fn reset_call_count(&self) {
        lock(&self.calls).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error> {
        lock(&self.calls).push(MockCall {
            prompt: prompt.to_string(),
            max_tokens,
        });

        if let Some(queued) = lock(&self.queue).pop_front() {
            return Ok(queued);
        }

        let rules = lock(&self.rules);
        match rules.iter().find(|(fragment, _)| prompt.contains(fragment.as_str())) {
            Some((_, MockReply::Text(response))) => Ok(response.clone()),
            Some((_, MockReply::Error)) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
