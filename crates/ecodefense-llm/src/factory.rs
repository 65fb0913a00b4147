//! Provider selection from settings

use crate::chat::{self, ChatCompletionsProvider};
use crate::ollama::{self, OllamaProvider};
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::{LlmError, MockProvider};
use ecodefense_domain::traits::{GenerationOptions, LlmProvider as LlmProviderTrait};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Which backend answers model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (Groq by default)
    Chat,
    /// Local Ollama
    Ollama,
    /// Canned responses, no network
    Mock,
}

impl ProviderKind {
    /// Parse from a config or CLI string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" | "groq" | "openai" => Some(ProviderKind::Chat),
            "ollama" => Some(ProviderKind::Ollama),
            "mock" => Some(ProviderKind::Mock),
            _ => None,
        }
    }
}

/// Settings needed to build a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Backend
    pub kind: ProviderKind,

    /// Model name
    pub model: String,

    /// Endpoint override; each backend has its own default
    pub endpoint: Option<String>,

    /// Environment variable holding the API key (chat backend only)
    pub api_key_env: String,

    /// HTTP timeout per request, in seconds
    pub timeout_secs: u64,

    /// Attempts per call, first call included
    pub max_attempts: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Chat,
            model: chat::DEFAULT_CHAT_MODEL.to_string(),
            endpoint: None,
            api_key_env: chat::DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: chat::DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProviderSettings {
    /// Retry policy applied to every call
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.max_attempts)
    }

    /// Longest a single call can take: every attempt timing out, plus backoff
    pub fn worst_case_call(&self) -> Duration {
        self.retry_policy()
            .worst_case(Duration::from_secs(self.timeout_secs))
    }
}

/// Any of the supported providers behind one type
#[derive(Debug)]
pub enum Provider {
    /// Mock provider
    Mock(MockProvider),
    /// Ollama provider
    Ollama(OllamaProvider),
    /// Chat completions provider
    Chat(ChatCompletionsProvider),
}

impl Provider {
    /// Build the provider described by `settings`
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let retry = settings.retry_policy();

        let provider = match settings.kind {
            ProviderKind::Mock => Provider::Mock(MockProvider::default()),
            ProviderKind::Ollama => {
                let endpoint = settings
                    .endpoint
                    .as_deref()
                    .unwrap_or(ollama::DEFAULT_ENDPOINT);
                Provider::Ollama(
                    OllamaProvider::new(endpoint, &settings.model, timeout)?.with_retry(retry),
                )
            }
            ProviderKind::Chat => {
                let endpoint = settings.endpoint.as_deref().unwrap_or(chat::GROQ_BASE_URL);
                Provider::Chat(
                    ChatCompletionsProvider::from_env(
                        endpoint,
                        &settings.model,
                        &settings.api_key_env,
                        timeout,
                    )?
                    .with_retry(retry),
                )
            }
        };

        info!(kind = ?settings.kind, model = %provider.model_name(), "LLM provider ready");
        Ok(provider)
    }
}

impl LlmProviderTrait for Provider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        match self {
            Provider::Mock(p) => p.generate(prompt, options),
            Provider::Ollama(p) => p.generate(prompt, options),
            Provider::Chat(p) => p.generate(prompt, options),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Provider::Mock(p) => p.model_name(),
            Provider::Ollama(p) => p.model_name(),
            Provider::Chat(p) => p.model_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(ProviderKind::parse("groq"), Some(ProviderKind::Chat));
        assert_eq!(ProviderKind::parse("Ollama"), Some(ProviderKind::Ollama));
        assert_eq!(ProviderKind::parse("mock"), Some(ProviderKind::Mock));
        assert_eq!(ProviderKind::parse("gpt"), None);
    }

    #[test]
    fn test_mock_from_settings() {
        let settings = ProviderSettings {
            kind: ProviderKind::Mock,
            ..Default::default()
        };
        let provider = Provider::from_settings(&settings).unwrap();
        assert_eq!(provider.model_name(), "mock");
        assert!(provider
            .generate("anything", &GenerationOptions::deterministic())
            .is_ok());
    }

    #[test]
    fn test_ollama_from_settings() {
        let settings = ProviderSettings {
            kind: ProviderKind::Ollama,
            model: "llama3".to_string(),
            ..Default::default()
        };
        let provider = Provider::from_settings(&settings).unwrap();
        assert!(matches!(provider, Provider::Ollama(_)));
        assert_eq!(provider.model_name(), "llama3");
    }

    #[test]
    fn test_chat_without_key_fails() {
        let settings = ProviderSettings {
            api_key_env: "ECODEFENSE_FACTORY_KEY_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Provider::from_settings(&settings),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: ProviderSettings = serde_json::from_str(r#"{"model": "gemma2-9b-it"}"#).unwrap();
        assert_eq!(settings.kind, ProviderKind::Chat);
        assert_eq!(settings.model, "gemma2-9b-it");
        assert_eq!(settings.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
