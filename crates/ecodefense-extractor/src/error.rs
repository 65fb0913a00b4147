//! Error types for the extraction and generation pipeline

use ecodefense_store::embedding::EmbeddingError;
use ecodefense_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the pipeline
///
/// Malformed model output and an unavailable knowledge base are not errors;
/// they come back as [`crate::PipelineWarning`]s next to partial results.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The document container could not be opened
    #[error("Could not open the document: {0}")]
    CorruptDocument(String),

    /// The document opened but yielded no text
    #[error(
        "No text could be extracted from the document ({pages} page(s)). \
         It is probably a scanned image; run it through OCR or upload another file."
    )]
    EmptyExtraction {
        /// Pages in the document
        pages: usize,
    },

    /// The language model call failed (after retries)
    #[error("Model call failed: {0}")]
    ModelCall(String),

    /// The language model call exceeded its time budget
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// The corpus directory held nothing that could be indexed
    #[error("No usable documents found in corpus: {0}")]
    EmptyCorpus(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Knowledge store error
    #[error("Knowledge store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for ExtractorError {
    fn from(e: tokio::task::JoinError) -> Self {
        ExtractorError::TaskJoin(e.to_string())
    }
}
