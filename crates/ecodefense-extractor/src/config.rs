//! Configuration for the intake pipeline and response generator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text chunking strategy for long documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Split by paragraphs (blank lines)
    #[default]
    ByParagraph,
    /// Split by sections (headers, numbered clauses)
    BySection,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum extracted text length (characters)
    pub max_text_length: usize,

    /// Deadline for one model call, provider retries included (seconds)
    pub model_timeout_secs: u64,

    /// Characters of document text sent with the registrant prompt
    pub registrant_prompt_chars: usize,

    /// Pages read by a registrant-only import
    pub registrant_page_limit: usize,

    /// Separator the model is asked to put between requirements
    pub requirement_delimiter: String,

    /// Requirements must be longer than this (characters)
    pub min_requirement_length: usize,

    /// Chunking strategy for the requirement prompt
    pub chunk_strategy: ChunkStrategy,

    /// Maximum chunk size for the requirement prompt (characters)
    pub max_chunk_size: usize,

    /// Passages retrieved per requirement
    pub retrieval_k: usize,

    /// Temperature used when regenerating a response
    pub regenerate_temperature: f32,

    /// Corpus window size when building the knowledge base (characters)
    pub corpus_chunk_size: usize,

    /// Overlap between consecutive corpus windows (characters)
    pub corpus_chunk_overlap: usize,
}

impl ExtractorConfig {
    /// Model call timeout as a Duration
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.max_chunk_size > self.max_text_length {
            return Err("max_chunk_size cannot exceed max_text_length".to_string());
        }
        if self.model_timeout_secs == 0 {
            return Err("model_timeout_secs must be greater than 0".to_string());
        }
        if self.registrant_prompt_chars == 0 {
            return Err("registrant_prompt_chars must be greater than 0".to_string());
        }
        if self.registrant_page_limit == 0 {
            return Err("registrant_page_limit must be greater than 0".to_string());
        }
        if self.requirement_delimiter.trim().is_empty() {
            return Err("requirement_delimiter cannot be blank".to_string());
        }
        if self.retrieval_k == 0 {
            return Err("retrieval_k must be greater than 0".to_string());
        }
        if !(self.regenerate_temperature > 0.0 && self.regenerate_temperature <= 2.0) {
            return Err("regenerate_temperature must be in (0, 2]".to_string());
        }
        if self.corpus_chunk_size == 0 {
            return Err("corpus_chunk_size must be greater than 0".to_string());
        }
        if self.corpus_chunk_overlap >= self.corpus_chunk_size {
            return Err("corpus_chunk_overlap must be smaller than corpus_chunk_size".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_length: 500_000,
            model_timeout_secs: 400,
            registrant_prompt_chars: 4000,
            registrant_page_limit: 3,
            requirement_delimiter: "###".to_string(),
            min_requirement_length: 10,
            chunk_strategy: ChunkStrategy::ByParagraph,
            max_chunk_size: 12_000,
            retrieval_k: 3,
            regenerate_temperature: 0.7,
            corpus_chunk_size: 1000,
            corpus_chunk_overlap: 200,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: shorter deadline, smaller chunks
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 200_000,
            model_timeout_secs: 200,
            max_chunk_size: 6_000,
            ..Self::default()
        }
    }

    /// Lenient preset: longer deadline, larger chunks, more context
    pub fn lenient() -> Self {
        Self {
            max_text_length: 1_000_000,
            model_timeout_secs: 900,
            chunk_strategy: ChunkStrategy::BySection,
            max_chunk_size: 24_000,
            retrieval_k: 5,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
