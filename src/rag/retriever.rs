//! Semantic retrieval against the persisted collection.

use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::RagError;
use crate::llm::LlmProvider;
use crate::store::{ChunkSearchResult, VectorStore};

pub struct DocumentRetriever {
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
}

impl DocumentRetriever {
    /// The store handle is opened eagerly by the composition root, so a
    /// retriever only exists when the collection is reachable. A mismatch
    /// between the configured embedding model and the one the collection was
    /// built with is logged here; mismatched vector spaces degrade relevance
    /// without any runtime error.
    pub async fn new(
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn LlmProvider>,
        settings: &Settings,
    ) -> Result<Self, RagError> {
        if let Some(stored_model) = store.embedding_model().await? {
            if stored_model != settings.embedding_model {
                tracing::warn!(
                    "Collection was embedded with '{}' but queries will use '{}'",
                    stored_model,
                    settings.embedding_model
                );
            }
        }

        Ok(Self {
            store,
            provider,
            embedding_model: settings.embedding_model.clone(),
        })
    }

    /// Top-`k` chunks most similar to the query, best first.
    ///
    /// Any embedding or search failure is absorbed: callers get an empty
    /// list and must treat it as "no relevant context", not as an error.
    pub async fn retrieve_documents(&self, query: &str, k: usize) -> Vec<ChunkSearchResult> {
        let query_embedding = match self
            .provider
            .embed(&[query.to_string()], &self.embedding_model)
            .await
        {
            Ok(mut embeddings) if !embeddings.is_empty() => embeddings.remove(0),
            Ok(_) => {
                tracing::error!("Embedding endpoint returned no vector for the query");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Error embedding query: {}", e);
                return Vec::new();
            }
        };

        match self.store.search(&query_embedding, k).await {
            Ok(results) => {
                tracing::info!("Retrieved {} relevant chunks", results.len());
                results
            }
            Err(e) => {
                tracing::error!("Error retrieving documents: {}", e);
                Vec::new()
            }
        }
    }
}
