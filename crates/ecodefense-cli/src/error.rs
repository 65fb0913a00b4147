//! Error types for the CLI application.

use ecodefense_domain::SessionError;
use ecodefense_extractor::ExtractorError;
use ecodefense_llm::LlmError;
use ecodefense_report::ReportError;
use ecodefense_store::embedding::EmbeddingError;
use ecodefense_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Import, generation or corpus ingestion failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Report rendering failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Knowledge base error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedder could not be built
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Language model provider could not be built
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Session operation rejected
    #[error(transparent)]
    Session(#[from] SessionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
