//! EcoDefense LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `ecodefense-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: deterministic mock for testing
//! - `OllamaProvider`: local Ollama API
//! - `ChatCompletionsProvider`: OpenAI-compatible chat completions (Groq by default)
//!
//! All providers block; async callers run them with `spawn_blocking`. Every
//! HTTP provider retries transient failures through a [`RetryPolicy`].
//!
//! # Examples
//!
//! ```
//! use ecodefense_llm::MockProvider;
//! use ecodefense_domain::traits::{GenerationOptions, LlmProvider};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt", &GenerationOptions::deterministic()).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod factory;
pub mod ollama;
pub mod retry;

use ecodefense_domain::traits::{GenerationOptions, LlmProvider as LlmProviderTrait};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use chat::ChatCompletionsProvider;
pub use factory::{Provider, ProviderKind, ProviderSettings};
pub use ollama::OllamaProvider;
pub use retry::RetryPolicy;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Server-side failure (HTTP 5xx)
    #[error("Server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// API key rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider could not be constructed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// True for failures worth another attempt (network, rate limit, 5xx, timeout)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Server { .. }
                | LlmError::RateLimitExceeded
                | LlmError::Timeout
        )
    }

    /// Map a non-success HTTP status to an error
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::Authentication(body),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            429 => LlmError::RateLimitExceeded,
            code if status.is_server_error() => LlmError::Server {
                status: code,
                message: body,
            },
            code => LlmError::Communication(format!("HTTP {}: {}", code, body)),
        }
    }

    /// Map a transport error to an error
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. At
/// temperature 0 the same prompt always yields the same text; above 0 each
/// call yields a distinct variant, which is enough to exercise regeneration.
///
/// # Examples
///
/// ```
/// use ecodefense_llm::MockProvider;
/// use ecodefense_domain::traits::{GenerationOptions, LlmProvider};
///
/// let options = GenerationOptions::deterministic();
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt", &options).unwrap(), "Fixed response");
///
/// // Responses chosen by a fragment of the prompt
/// let provider = MockProvider::default();
/// provider.respond_when_contains("registrant", "COMPANY: Acme");
/// assert_eq!(provider.generate("extract the registrant", &options).unwrap(), "COMPANY: Acme");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    contains_rules: Arc<Mutex<Vec<(String, String)>>>,
    errors: Arc<Mutex<Vec<String>>>,
    pending_failures: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<(String, GenerationOptions)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            contains_rules: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
            pending_failures: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for an exact prompt
    pub fn add_response(&self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Respond with `response` whenever the prompt contains `needle`
    ///
    /// Rules are checked in insertion order after exact matches.
    pub fn respond_when_contains(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.contains_rules
            .lock()
            .unwrap()
            .push((needle.into(), response.into()));
    }

    /// Fail every prompt containing `needle` with a non-retryable error
    pub fn add_error(&self, needle: impl Into<String>) {
        self.errors.lock().unwrap().push(needle.into());
    }

    /// Fail the next `times` calls with a transient communication error
    pub fn fail_times(&self, times: usize) {
        *self.pending_failures.lock().unwrap() = times;
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count and recorded prompts
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
        self.prompts.lock().unwrap().clear();
    }

    /// Prompts received so far, with their options
    pub fn prompts(&self) -> Vec<(String, GenerationOptions)> {
        self.prompts.lock().unwrap().clone()
    }

    fn lookup(&self, prompt: &str) -> String {
        if let Some(response) = self.responses.lock().unwrap().get(prompt) {
            return response.clone();
        }

        self.contains_rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        let call = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), *options));

        {
            let mut pending = self.pending_failures.lock().unwrap();
            if *pending > 0 {
                *pending -= 1;
                return Err(LlmError::Communication("Mock transient failure".to_string()));
            }
        }

        if self
            .errors
            .lock()
            .unwrap()
            .iter()
            .any(|needle| prompt.contains(needle.as_str()))
        {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        let response = self.lookup(prompt);
        if options.is_deterministic() {
            Ok(response)
        } else {
            Ok(format!("{} (variant {})", response, call))
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det() -> GenerationOptions {
        GenerationOptions::deterministic()
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt", &det());
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.respond_when_contains("foo", "bar");

        assert_eq!(provider.generate("hello", &det()).unwrap(), "world");
        assert_eq!(provider.generate("a foo prompt", &det()).unwrap(), "bar");
        assert_eq!(
            provider.generate("unknown", &det()).unwrap(),
            "Default mock response"
        );
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1", &det()).unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2", &det()).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts()[1].0, "prompt2");

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
        assert!(provider.prompts().is_empty());
    }

    #[test]
    fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("a bad prompt", &det());
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[test]
    fn test_mock_provider_deterministic_at_zero() {
        let provider = MockProvider::new("same");
        let a = provider.generate("p", &det()).unwrap();
        let b = provider.generate("p", &det()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mock_provider_varies_above_zero() {
        let provider = MockProvider::new("base");
        let options = GenerationOptions::with_temperature(0.7);
        let a = provider.generate("p", &options).unwrap();
        let b = provider.generate("p", &options).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("base"));
    }

    #[test]
    fn test_mock_provider_fail_times_with_retry() {
        let provider = MockProvider::new("ok");
        provider.fail_times(2);

        let policy = RetryPolicy::exponential(3).with_initial_backoff(std::time::Duration::ZERO);
        let result = policy.run(|_| provider.generate("p", &det()));

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_mock_provider_fail_times_without_retry() {
        let provider = MockProvider::new("ok");
        provider.fail_times(1);

        let result = RetryPolicy::none().run(|_| provider.generate("p", &det()));
        assert!(matches!(result, Err(LlmError::Communication(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test", &det()).unwrap();

        // Both share the same call count
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::RateLimitExceeded.is_retryable());
        assert!(LlmError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!LlmError::InvalidResponse(String::new()).is_retryable());
        assert!(!LlmError::Configuration(String::new()).is_retryable());
    }

    #[test]
    fn test_from_status() {
        use reqwest::StatusCode;
        assert!(matches!(
            LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new(), "m"),
            LlmError::RateLimitExceeded
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::NOT_FOUND, String::new(), "m"),
            LlmError::ModelNotAvailable(_)
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LlmError::Authentication(_)
        ));
        assert!(matches!(
            LlmError::from_status(StatusCode::BAD_GATEWAY, String::new(), "m"),
            LlmError::Server { status: 502, .. }
        ));
    }
}
