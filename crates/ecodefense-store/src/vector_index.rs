//! HNSW Vector Index for Semantic Search
//!
//! A wrapper around the HNSW algorithm for nearest-neighbour search over
//! chunk embeddings.
//!
//! # Architecture
//!
//! - In-memory only; rebuilt from the SQLite chunk table on open
//! - Keyed by `ChunkId` (the chunk's SQLite rowid)
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search, passed per query

use crate::ChunkId;
use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Default efSearch for queries
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Internal error (poisoned lock)
    #[error("HNSW error: {0}")]
    Internal(String),
}

/// HNSW index over chunk embeddings
///
/// # Examples
///
/// ```no_run
/// use ecodefense_store::vector_index::VectorIndex;
/// use ecodefense_store::ChunkId;
///
/// let index = VectorIndex::new(384);
/// let embedding = vec![0.1; 384];
/// index.add(ChunkId(1), &embedding).unwrap();
///
/// let results = index.search(&embedding, 5, 64).unwrap();
/// ```
pub struct VectorIndex {
    dimension: usize,
    hnsw: Arc<Mutex<Hnsw<'static, f32, DistCosine>>>,
    id_map: Arc<Mutex<HashMap<usize, ChunkId>>>,
    next_id: Arc<Mutex<usize>>,
}

fn new_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

fn poisoned<T>(_: T) -> VectorIndexError {
    VectorIndexError::Internal("index lock poisoned".to_string())
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            hnsw: Arc::new(Mutex::new(new_hnsw())),
            id_map: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Embedding dimension this index accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add a chunk embedding to the index
    pub fn add(&self, chunk_id: ChunkId, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let internal_id = {
            let mut next_id = self.next_id.lock().map_err(poisoned)?;
            let id = *next_id;
            *next_id += 1;
            id
        };

        self.id_map
            .lock()
            .map_err(poisoned)?
            .insert(internal_id, chunk_id);

        let embedding_vec = embedding.to_vec();
        let hnsw = self.hnsw.lock().map_err(poisoned)?;
        hnsw.insert((&embedding_vec, internal_id));

        Ok(())
    }

    /// Search for the k nearest neighbours to the given embedding
    ///
    /// Returns `(ChunkId, similarity)` pairs sorted by similarity, descending.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(ChunkId, f32)>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let hnsw = self.hnsw.lock().map_err(poisoned)?;
        let id_map = self.id_map.lock().map_err(poisoned)?;

        let mut results: Vec<(ChunkId, f32)> = hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                id_map
                    .get(&neighbour.d_id)
                    .map(|&chunk_id| (chunk_id, 1.0 - neighbour.distance))
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(k);
        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.id_map.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
