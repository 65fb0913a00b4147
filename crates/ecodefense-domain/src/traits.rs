//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the services it
//! calls. Implementations live in other crates.

use serde::{Deserialize, Serialize};

/// Sampling options for a single generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature; 0.0 asks the model to be deterministic
    pub temperature: f32,

    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Deterministic options (temperature 0.0)
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Options with the given temperature
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    /// True when the temperature is zero
    pub fn is_deterministic(&self) -> bool {
        self.temperature <= f32::EPSILON
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (ecodefense-llm). Calls block; the
/// pipeline runs them on the blocking pool.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a completion for `prompt`
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error>;

    /// Name of the model answering the calls
    fn model_name(&self) -> &str;
}

/// A passage returned by the knowledge index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text, opaque to the pipeline
    pub text: String,

    /// Where the passage came from (file name or other label)
    pub source: String,

    /// Similarity to the query, higher is closer
    pub score: f32,
}

/// Trait for retrieving grounding context
///
/// Implemented by the infrastructure layer (ecodefense-store).
pub trait KnowledgeRetriever {
    /// Error type for retrieval operations
    type Error;

    /// Return up to `k` passages ranked by similarity to `query`
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, Self::Error>;

    /// False when there is no index to search (missing or empty)
    fn is_available(&self) -> bool;
}
