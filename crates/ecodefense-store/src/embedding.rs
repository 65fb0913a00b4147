//! Embedding Models for Text Vectorization
//!
//! Text-to-vector conversion for the knowledge index.
//!
//! # Models
//!
//! - **MockEmbeddingModel**: hashed bag-of-words, deterministic and offline.
//!   Texts sharing words land close together, which is enough for retrieval
//!   tests and for running without an embedding server.
//! - **OllamaEmbeddingModel**: `POST /api/embeddings` on a local Ollama.
//!
//! # Examples
//!
//! ```rust
//! use ecodefense_store::embedding::{MockEmbeddingModel, EmbeddingModel};
//!
//! let model = MockEmbeddingModel::new(384);
//! let text = "Effluent monitoring report";
//! let embedding = model.embed(text).unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! let embedding2 = model.embed(text).unwrap();
//! assert_eq!(embedding, embedding2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default Ollama endpoint for embeddings
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Default Ollama embedding model
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";

/// Dimension of `nomic-embed-text`
pub const DEFAULT_OLLAMA_DIMENSION: usize = 768;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),

    /// Could not reach the embedding service
    #[error("Embedding service unreachable: {0}")]
    Communication(String),

    /// Embedder could not be constructed
    #[error("Embedding configuration error: {0}")]
    Configuration(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;

    /// Name recorded in the index so a mismatched embedder can be refused
    fn model_name(&self) -> &str;
}

/// Mock embedding model (hashed bag-of-words)
///
/// - **Deterministic**: same text always produces same embedding
/// - **Normalized**: unit length, so cosine similarity is a dot product
/// - **Lexical**: each lowercase word adds +/-1 to one hashed dimension
///
/// Text with no word characters falls back to a per-dimension hash of the
/// whole string.
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    dimension: usize,
    name: String,
}

impl MockEmbeddingModel {
    /// Create a new mock embedding model
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            name: format!("mock-bow-{}", dimension),
        }
    }

    fn hash_of<T: Hash + ?Sized>(value: &T, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        seed.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash text with a seed to get a deterministic f32 value in [-1, 1]
    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let hash_value = Self::hash_of(text, seed);
        let normalized = (hash_value as f64 / u64::MAX as f64) * 2.0 - 1.0;
        normalized as f32
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(EmbeddingError::Configuration(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let hash = Self::hash_of(token.as_str(), 0);
            let slot = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[slot] += sign;
            tokens += 1;
        }

        if tokens == 0 {
            for (i, value) in embedding.iter_mut().enumerate() {
                *value = Self::hash_with_seed(text, i as u64);
            }
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Embedding model served by Ollama
#[derive(Debug)]
pub struct OllamaEmbeddingModel {
    endpoint: String,
    model: String,
    dimension: usize,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbeddingModel {
    /// Create a new Ollama embedding model producing `dimension`-sized vectors
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                EmbeddingError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
            client,
        })
    }
}

impl EmbeddingModel for OllamaEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!(model = %self.model, chars = text.len(), "Ollama embed");

        let response = self
            .client
            .post(&url)
            .json(&OllamaEmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .map_err(|e| EmbeddingError::Communication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::InferenceFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: OllamaEmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Bad response: {}", e)))?;

        if parsed.embedding.len() != self.dimension {
            return Err(EmbeddingError::InferenceFailed(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                parsed.embedding.len(),
                self.dimension
            )));
        }
        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Hashed bag-of-words, offline; lexical overlap only
    Mock,
    /// Local Ollama
    Ollama,
}

/// Settings needed to build an embedder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Backend
    pub kind: EmbedderKind,
    /// Model name (Ollama only)
    pub model: String,
    /// Endpoint (Ollama only)
    pub endpoint: String,
    /// Vector dimension
    pub dimension: usize,
    /// HTTP timeout per request, in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Ollama,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            dimension: DEFAULT_OLLAMA_DIMENSION,
            timeout_secs: 60,
        }
    }
}

impl EmbeddingSettings {
    /// Offline hashed embedder, for tests and machines without Ollama
    pub fn offline(dimension: usize) -> Self {
        Self {
            kind: EmbedderKind::Mock,
            dimension,
            ..Self::default()
        }
    }
}

/// Any supported embedder behind one type
#[derive(Debug)]
pub enum Embedder {
    /// Mock embedder
    Mock(MockEmbeddingModel),
    /// Ollama embedder
    Ollama(OllamaEmbeddingModel),
}

impl Embedder {
    /// Build the embedder described by `settings`
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        match settings.kind {
            EmbedderKind::Mock => Ok(Embedder::Mock(MockEmbeddingModel::new(settings.dimension))),
            EmbedderKind::Ollama => Ok(Embedder::Ollama(OllamaEmbeddingModel::new(
                &settings.endpoint,
                &settings.model,
                settings.dimension,
                Duration::from_secs(settings.timeout_secs),
            )?)),
        }
    }
}

impl EmbeddingModel for Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Embedder::Mock(m) => m.embed(text),
            Embedder::Ollama(m) => m.embed(text),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            Embedder::Mock(m) => m.dimension(),
            Embedder::Ollama(m) => m.dimension(),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Embedder::Mock(m) => m.model_name(),
            Embedder::Ollama(m) => m.model_name(),
        }
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]; 0.0 when either vector is zero.
///
/// # Panics
///
/// Panics if vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_embedding_deterministic() {
        let model = MockEmbeddingModel::new(384);

        let text = "The quick brown fox jumps over the lazy dog";
        let embedding1 = model.embed(text).unwrap();
        let embedding2 = model.embed(text).unwrap();

        assert_eq!(embedding1, embedding2, "Same text should produce same embedding");
    }

    #[test]
    fn test_mock_embedding_dimension() {
        let model = MockEmbeddingModel::new(128);

        let embedding = model.embed("test").unwrap();
        assert_eq!(embedding.len(), 128);
        assert_eq!(model.dimension(), 128);
        assert_eq!(model.model_name(), "mock-bow-128");
    }

    #[test]
    fn test_mock_embedding_normalized() {
        let model = MockEmbeddingModel::new(384);

        let embedding = model.embed("test text").unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001, "Embedding should be normalized");
    }

    #[test]
    fn test_mock_embedding_shared_words_are_closer() {
        let model = MockEmbeddingModel::new(384);

        let query = model.embed("effluent treatment station").unwrap();
        let related = model.embed("the effluent treatment station was upgraded").unwrap();
        let unrelated = model.embed("noise levels at the northern boundary").unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_mock_embedding_ignores_case_and_punctuation() {
        let model = MockEmbeddingModel::new(384);

        let a = model.embed("The cat sat on the mat").unwrap();
        let b = model.embed("the cat sat on the MAT.").unwrap();
        assert!(cosine_similarity(&a, &b) > 0.999);
    }

    #[test]
    fn test_mock_embedding_symbols_only() {
        let model = MockEmbeddingModel::new(64);

        let embedding = model.embed("--- ###").unwrap();
        assert_eq!(embedding.len(), 64);
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_mock_embedding_empty_text() {
        let model = MockEmbeddingModel::new(384);

        let result = model.embed("   ");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Empty text"));
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let vec = vec![1.0, 0.0, 0.0];
        let similarity = cosine_similarity(&vec, &vec);
        assert!((similarity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&vec1, &vec2).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec1, &vec2) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_embedder_from_settings() {
        let embedder = Embedder::from_settings(&EmbeddingSettings::default()).unwrap();
        assert!(matches!(embedder, Embedder::Ollama(_)));
        assert_eq!(embedder.model_name(), DEFAULT_OLLAMA_MODEL);
        assert_eq!(embedder.dimension(), DEFAULT_OLLAMA_DIMENSION);

        let embedder = Embedder::from_settings(&EmbeddingSettings::offline(384)).unwrap();
        assert!(matches!(embedder, Embedder::Mock(_)));
        assert_eq!(embedder.dimension(), 384);
    }

    #[test]
    #[ignore]
    fn test_ollama_embedding_integration() {
        let model = OllamaEmbeddingModel::new(
            DEFAULT_OLLAMA_ENDPOINT,
            DEFAULT_OLLAMA_MODEL,
            DEFAULT_OLLAMA_DIMENSION,
            Duration::from_secs(30),
        )
        .unwrap();
        let embedding = model.embed("licence conditions").unwrap();
        assert_eq!(embedding.len(), DEFAULT_OLLAMA_DIMENSION);
    }
}
