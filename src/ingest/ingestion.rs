//! Ingestion orchestrator: loader -> splitter -> embeddings -> collection.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::loader::load_documents;
use super::splitter::RecursiveCharacterSplitter;
use super::Chunk;
use crate::core::config::Settings;
use crate::core::errors::RagError;
use crate::llm::LlmProvider;
use crate::store::{StoredChunk, VectorStore};

/// Number of chunks embedded per request to the embedding endpoint.
const EMBED_BATCH_SIZE: usize = 32;

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents successfully loaded this run.
    pub documents: usize,
    /// Chunks appended to the collection this run.
    pub chunks_added: usize,
    /// Chunk count of the collection after the run.
    pub total_chunks: usize,
}

pub struct DocumentIngestion {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn LlmProvider>,
    splitter: RecursiveCharacterSplitter,
    embedding_model: String,
    raw_dir: PathBuf,
}

impl DocumentIngestion {
    pub fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn LlmProvider>,
        settings: &Settings,
        raw_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            provider,
            splitter: RecursiveCharacterSplitter::new(settings.chunk_size, settings.chunk_overlap),
            embedding_model: settings.embedding_model.clone(),
            raw_dir,
        }
    }

    /// Complete ingestion pipeline.
    ///
    /// Returns `Ok(None)` when the raw-documents directory yields nothing —
    /// the collection is left untouched and this is not an error. Re-running
    /// on unchanged files appends duplicate chunks; there is no dedup.
    /// Embedding or store failures abort the run and propagate.
    pub async fn process_and_store(&self) -> Result<Option<IngestReport>, RagError> {
        tracing::info!("Starting document ingestion...");

        let documents = load_documents(&self.raw_dir);
        if documents.is_empty() {
            tracing::warn!("No documents found to process");
            return Ok(None);
        }

        tracing::info!("Total documents: {}", documents.len());
        let chunks = self.splitter.split_documents(&documents);
        tracing::info!("Split into {} chunks", chunks.len());

        if let Some(stored_model) = self.store.embedding_model().await? {
            if stored_model != self.embedding_model {
                tracing::warn!(
                    "Collection was built with embedding model '{}', now ingesting with '{}'; \
                     mixed vector spaces will degrade retrieval",
                    stored_model,
                    self.embedding_model
                );
            }
        }

        let mut added = 0;
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.provider.embed(&inputs, &self.embedding_model).await?;

            let items: Vec<(StoredChunk, Vec<f32>)> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| (to_stored(chunk), embedding))
                .collect();

            added += items.len();
            self.store.insert_batch(items).await?;
        }

        self.store
            .record_embedding_model(&self.embedding_model)
            .await?;

        let total_chunks = self.store.count().await?;
        tracing::info!("Successfully ingested {} chunks into the collection", added);

        Ok(Some(IngestReport {
            documents: documents.len(),
            chunks_added: added,
            total_chunks,
        }))
    }
}

fn to_stored(chunk: &Chunk) -> StoredChunk {
    StoredChunk {
        chunk_id: uuid::Uuid::new_v4().to_string(),
        content: chunk.content.clone(),
        source: chunk.metadata.source.clone(),
        page: chunk.metadata.page,
        metadata: Some(serde_json::json!({
            "start_offset": chunk.start_offset,
            "chunk_index": chunk.chunk_index,
        })),
    }
}
