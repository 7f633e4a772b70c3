//! Persisted vector collection.
//!
//! The collection is the only durable state in the pipeline. It is append-only
//! from the pipeline's perspective: ingestion inserts, retrieval searches,
//! nothing updates or deletes.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

pub use sqlite::SqliteVectorStore;

/// A chunk persisted in the vector collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source identifier (relative file path).
    pub source: String,
    /// Page number for paginated sources.
    pub page: Option<u32>,
    /// Optional extra metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

/// Abstract interface over the vector collection backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append chunks with their embedding vectors in one transaction.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), RagError>;

    /// Return the chunks most similar to the query embedding,
    /// ranked by descending similarity, at most `limit` of them.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, RagError>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize, RagError>;

    /// Name of the embedding model the collection was built with, if recorded.
    async fn embedding_model(&self) -> Result<Option<String>, RagError>;

    /// Record the embedding model used for the vectors in this collection.
    async fn record_embedding_model(&self, model: &str) -> Result<(), RagError>;
}
