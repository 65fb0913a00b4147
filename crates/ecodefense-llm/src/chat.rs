//! OpenAI-compatible chat completions provider
//!
//! Talks to any endpoint implementing `POST {base}/chat/completions`. The
//! default base URL is Groq's. The API key is read from the environment and
//! kept in a [`SecretString`] so it never shows up in `Debug` output or logs.

use crate::retry::RetryPolicy;
use crate::LlmError;
use ecodefense_domain::traits::{GenerationOptions, LlmProvider as LlmProviderTrait};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Groq's OpenAI-compatible base URL
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Default timeout for chat requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Chat completions provider
#[derive(Debug)]
pub struct ChatCompletionsProvider {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
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

impl ChatCompletionsProvider {
    /// Create a provider with an explicit key
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(LlmError::Configuration("API key is empty".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a provider reading the key from the environment variable `key_env`
    ///
    /// A missing variable is a configuration error.
    pub fn from_env(
        base_url: impl Into<String>,
        model: impl Into<String>,
        key_env: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let key = std::env::var(key_env).map_err(|_| {
            LlmError::Configuration(format!(
                "API key not found. Set the {} environment variable.",
                key_env
            ))
        })?;
        Self::new(base_url, model, SecretString::new(key), timeout)
    }

    /// Groq defaults: base URL, `GROQ_API_KEY`, default model and timeout
    pub fn groq() -> Result<Self, LlmError> {
        Self::from_env(
            GROQ_BASE_URL,
            DEFAULT_CHAT_MODEL,
            DEFAULT_API_KEY_ENV,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL this provider talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_once(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status, body, &self.model));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        extract_content(parsed)
    }
}

fn extract_content(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))
}

impl LlmProviderTrait for ChatCompletionsProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            temperature = options.temperature,
            "Chat completion"
        );
        self.retry.run(|_| self.generate_once(prompt, options))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn test_new_trims_base_url() {
        let provider = ChatCompletionsProvider::new(
            "https://example.test/v1/",
            "some-model",
            key("sk-test"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url(), "https://example.test/v1");
        assert_eq!(provider.model_name(), "some-model");
    }

    #[test]
    fn test_empty_key_rejected() {
        let result =
            ChatCompletionsProvider::new(GROQ_BASE_URL, "m", key("  "), Duration::from_secs(5));
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_missing_env_key_is_configuration_error() {
        let result = ChatCompletionsProvider::from_env(
            GROQ_BASE_URL,
            "m",
            "ECODEFENSE_TEST_KEY_THAT_IS_NEVER_SET",
            Duration::from_secs(5),
        );
        match result {
            Err(LlmError::Configuration(msg)) => {
                assert!(msg.contains("ECODEFENSE_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = ChatCompletionsProvider::new(
            GROQ_BASE_URL,
            "m",
            key("sk-very-secret"),
            Duration::from_secs(5),
        )
        .unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn test_extract_content() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"COMPANY: Acme"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(parsed).unwrap(), "COMPANY: Acme");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(empty),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.0,
            max_tokens: Some(512),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    #[ignore]
    fn test_groq_generate_integration() {
        let provider = ChatCompletionsProvider::groq().unwrap();
        let text = provider
            .generate("Say 'hello' and nothing else", &GenerationOptions::deterministic())
            .unwrap();
        assert!(!text.is_empty());
    }
}
