//! Ollama Provider Implementation
//!
//! Integration with Ollama's local LLM API (`POST /api/generate`).
//!
//! # Features
//!
//! - Blocking HTTP client, meant to be driven from `spawn_blocking`
//! - Configurable endpoint, model and timeout
//! - Retry with exponential backoff through [`RetryPolicy`]
//!
//! # Examples
//!
//! ```no_run
//! use ecodefense_llm::OllamaProvider;
//! use ecodefense_domain::traits::{GenerationOptions, LlmProvider};
//!
//! let provider = OllamaProvider::default_endpoint("llama3").unwrap();
//! let text = provider.generate("Say hello", &GenerationOptions::deterministic()).unwrap();
//! ```

use crate::retry::RetryPolicy;
use crate::LlmError;
use ecodefense_domain::traits::{GenerationOptions, LlmProvider as LlmProviderTrait};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API provider for local LLM inference
#[derive(Debug)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    /// - `timeout`: Per-request HTTP timeout
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a provider on `http://localhost:11434` with the default timeout
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(
            DEFAULT_ENDPOINT,
            model,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint this provider talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn generate_once(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status, body, &self.model));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.response)
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            temperature = options.temperature,
            "Ollama generate"
        );
        self.retry.run(|_| self.generate_once(prompt, options))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
