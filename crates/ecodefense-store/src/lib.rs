//! EcoDefense Knowledge Store
//!
//! Persisted knowledge base the response generator draws its context from.
//!
//! # Architecture
//!
//! - SQLite holds chunks (source, ordinal, text, embedding) and the index
//!   metadata (embedding model name, dimension, build time)
//! - The HNSW index is in-memory and rebuilt from SQLite when a
//!   [`KnowledgeBase`] is opened
//! - A knowledge base built with one embedder refuses to open with another
//!
//! # Examples
//!
//! ```no_run
//! use ecodefense_store::KnowledgeStore;
//!
//! let store = KnowledgeStore::open(":memory:").unwrap();
//! assert!(store.metadata().unwrap().is_none());
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod retriever;
pub mod vector_index;

use embedding::EmbeddingError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use vector_index::VectorIndexError;

pub use embedding::{Embedder, EmbeddingModel, EmbeddingSettings, MockEmbeddingModel};
pub use retriever::{EmptyRetriever, KnowledgeBase};
pub use vector_index::VectorIndex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS index_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    model TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    built_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Embedding (de)serialization error
    #[error("Invalid stored embedding: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding model failure
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector index failure
    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),

    /// Nothing has been built into this database yet
    #[error("Knowledge base has not been built; run the index command first")]
    NotBuilt,

    /// Embedding dimension differs from the index
    #[error("Embedding dimension {actual} does not match the index ({expected})")]
    DimensionMismatch {
        /// Dimension recorded in the index
        expected: usize,
        /// Dimension supplied
        actual: usize,
    },

    /// The knowledge base was built with a different embedder
    #[error(
        "Knowledge base was built with '{stored_model}' ({stored_dimension} dims) \
         but the configured embedder is '{model}' ({dimension} dims); rebuild the index"
    )]
    ModelMismatch {
        /// Model recorded in the index
        stored_model: String,
        /// Dimension recorded in the index
        stored_dimension: usize,
        /// Configured model
        model: String,
        /// Configured dimension
        dimension: usize,
    },
}

/// Row id of a stored chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(pub i64);

/// A stored passage of the knowledge corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Row id
    pub id: ChunkId,
    /// Source label (file path relative to the corpus root)
    pub source: String,
    /// Position of the chunk within its source
    pub ordinal: usize,
    /// Chunk text
    pub content: String,
}

/// What the index was built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Embedding model name
    pub model: String,
    /// Embedding dimension
    pub dimension: usize,
    /// RFC 3339 build timestamp
    pub built_at: String,
}

/// Per-source chunk count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Source label
    pub source: String,
    /// Number of chunks from it
    pub chunks: usize,
}

/// A source label and its chunks, each `(text, embedding)`
pub type SourceChunks = (String, Vec<(String, Vec<f32>)>);

/// SQLite-backed chunk store
///
/// SQLite connections are not thread-safe; open one store per thread.
pub struct KnowledgeStore {
    conn: Connection,
}

impl KnowledgeStore {
    /// Open (or create) a store at `path`; `:memory:` gives an in-memory store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Metadata of the last build, if any
    pub fn metadata(&self) -> Result<Option<IndexMetadata>, StoreError> {
        let meta = self
            .conn
            .query_row(
                "SELECT model, dimension, built_at FROM index_meta WHERE id = 1",
                [],
                |row| {
                    Ok(IndexMetadata {
                        model: row.get(0)?,
                        dimension: row.get::<_, i64>(1)? as usize,
                        built_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    }

    /// Refuse an embedder that differs from the one the index was built with
    pub fn check_model(&self, model: &str, dimension: usize) -> Result<IndexMetadata, StoreError> {
        let meta = self.metadata()?.ok_or(StoreError::NotBuilt)?;
        if meta.model != model || meta.dimension != dimension {
            return Err(StoreError::ModelMismatch {
                stored_model: meta.model,
                stored_dimension: meta.dimension,
                model: model.to_string(),
                dimension,
            });
        }
        Ok(meta)
    }

    /// Drop every chunk and record a fresh build for `model`/`dimension`
    pub fn reset(&mut self, model: &str, dimension: usize) -> Result<(), StoreError> {
        let built_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO index_meta (id, model, dimension, built_at) VALUES (1, ?1, ?2, ?3)",
            params![model, dimension as i64, built_at],
        )?;
        tx.commit()?;
        info!(model, dimension, "Knowledge store reset");
        Ok(())
    }

    /// Replace every chunk and the index metadata in one transaction
    ///
    /// On any failure the previous contents and metadata are kept. Returns
    /// the number of chunks stored.
    pub fn replace_all(
        &mut self,
        model: &str,
        dimension: usize,
        documents: &[SourceChunks],
    ) -> Result<usize, StoreError> {
        let built_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute(
            "INSERT OR REPLACE INTO index_meta (id, model, dimension, built_at) VALUES (1, ?1, ?2, ?3)",
            params![model, dimension as i64, built_at],
        )?;

        let mut stored = 0;
        for (source, chunks) in documents {
            stored += insert_chunks(&tx, source, chunks, dimension)?;
        }
        tx.commit()?;

        info!(
            model,
            dimension,
            sources = documents.len(),
            chunks = stored,
            "Knowledge store replaced"
        );
        Ok(stored)
    }

    /// Insert the chunks of one source, in order, in a single transaction
    ///
    /// Each entry is `(text, embedding)`. Returns the number inserted.
    pub fn insert_document(
        &mut self,
        source: &str,
        chunks: &[(String, Vec<f32>)],
    ) -> Result<usize, StoreError> {
        let meta = self.metadata()?.ok_or(StoreError::NotBuilt)?;
        let tx = self.conn.transaction()?;
        let inserted = insert_chunks(&tx, source, chunks, meta.dimension)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Number of stored chunks
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// True when no chunk is stored
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Get one chunk by id
    pub fn get_chunk(&self, id: ChunkId) -> Result<Option<Chunk>, StoreError> {
        let chunk = self
            .conn
            .query_row(
                "SELECT id, source, ordinal, content FROM chunks WHERE id = ?1",
                params![id.0],
                |row| {
                    Ok(Chunk {
                        id: ChunkId(row.get(0)?),
                        source: row.get(1)?,
                        ordinal: row.get::<_, i64>(2)? as usize,
                        content: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(chunk)
    }

    /// Every chunk with its embedding, in insertion order
    pub fn load_all(&self) -> Result<Vec<(Chunk, Vec<f32>)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, source, ordinal, content, embedding FROM chunks ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                Chunk {
                    id: ChunkId(row.get(0)?),
                    source: row.get(1)?,
                    ordinal: row.get::<_, i64>(2)? as usize,
                    content: row.get(3)?,
                },
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut loaded = Vec::new();
        for row in rows {
            let (chunk, embedding_json) = row?;
            let embedding: Vec<f32> = serde_json::from_str(&embedding_json)?;
            loaded.push((chunk, embedding));
        }
        Ok(loaded)
    }

    /// Chunk counts per source, sorted by source
    pub fn sources(&self) -> Result<Vec<SourceSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) FROM chunks GROUP BY source ORDER BY source",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceSummary {
                source: row.get(0)?,
                chunks: row.get::<_, i64>(1)? as usize,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }
}

fn insert_chunks(
    conn: &Connection,
    source: &str,
    chunks: &[(String, Vec<f32>)],
    dimension: usize,
) -> Result<usize, StoreError> {
    if let Some((_, bad)) = chunks.iter().find(|(_, e)| e.len() != dimension) {
        return Err(StoreError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO chunks (source, ordinal, content, embedding) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (ordinal, (content, embedding)) in chunks.iter().enumerate() {
        let embedding_json = serde_json::to_string(embedding)?;
        stmt.execute(params![source, ordinal as i64, content, embedding_json])?;
    }

    debug!(source, chunks = chunks.len(), "Inserted document chunks");
    Ok(chunks.len())
}
