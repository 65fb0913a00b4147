//! `KnowledgeRetriever` implementations

use crate::embedding::EmbeddingModel;
use crate::vector_index::{VectorIndex, DEFAULT_EF_SEARCH};
use crate::{Chunk, ChunkId, IndexMetadata, KnowledgeStore, StoreError};
use ecodefense_domain::traits::{KnowledgeRetriever, Passage};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A knowledge base loaded into memory: chunk texts plus their HNSW index
///
/// Opening rebuilds the index from SQLite; the connection is not kept, so a
/// `KnowledgeBase` can be shared across threads when its embedder can.
pub struct KnowledgeBase<E> {
    embedder: E,
    index: VectorIndex,
    chunks: HashMap<ChunkId, Chunk>,
    metadata: IndexMetadata,
    ef_search: usize,
}

impl<E: EmbeddingModel> KnowledgeBase<E> {
    /// Open the knowledge base stored at `path`
    pub fn open<P: AsRef<Path>>(path: P, embedder: E) -> Result<Self, StoreError> {
        let store = KnowledgeStore::open(path)?;
        Self::from_store(&store, embedder)
    }

    /// Load every chunk of `store` and rebuild the vector index
    ///
    /// Fails with `ModelMismatch` if `embedder` is not the one the store
    /// was built with, and with `NotBuilt` if nothing was ever built.
    pub fn from_store(store: &KnowledgeStore, embedder: E) -> Result<Self, StoreError> {
        let metadata = store.check_model(embedder.model_name(), embedder.dimension())?;

        let index = VectorIndex::new(metadata.dimension);
        let mut chunks = HashMap::new();
        for (chunk, embedding) in store.load_all()? {
            index.add(chunk.id, &embedding)?;
            chunks.insert(chunk.id, chunk);
        }

        info!(
            chunks = chunks.len(),
            model = %metadata.model,
            "Knowledge base loaded"
        );

        Ok(Self {
            embedder,
            index,
            chunks,
            metadata,
            ef_search: DEFAULT_EF_SEARCH,
        })
    }

    /// Number of chunks loaded
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when the knowledge base holds no chunk
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// What the index was built with
    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }
}

impl<E: EmbeddingModel> KnowledgeRetriever for KnowledgeBase<E> {
    type Error = StoreError;

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, Self::Error> {
        if self.chunks.is_empty() || k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query)?;
        let hits = self.index.search(&embedding, k, self.ef_search)?;

        let passages: Vec<Passage> = hits
            .into_iter()
            .filter_map(|(id, score)| {
                self.chunks.get(&id).map(|chunk| Passage {
                    text: chunk.content.clone(),
                    source: chunk.source.clone(),
                    score,
                })
            })
            .collect();

        debug!(k, found = passages.len(), "Retrieved passages");
        Ok(passages)
    }

    fn is_available(&self) -> bool {
        !self.chunks.is_empty()
    }
}

/// Retriever used when no knowledge base could be opened
///
/// Always returns an empty context and reports itself unavailable, so
/// generation proceeds with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRetriever;

impl KnowledgeRetriever for EmptyRetriever {
    type Error = StoreError;

    fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Passage>, Self::Error> {
        Ok(Vec::new())
    }

    fn is_available(&self) -> bool {
        false
    }
}
