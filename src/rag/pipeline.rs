//! Composition root for the RAG pipeline.
//!
//! Constructed once per process and handed to the presentation layer; the
//! pipeline owns the collection handle and the model client, the caller owns
//! the chat history.

use std::sync::Arc;

use super::generator::ResponseGenerator;
use super::retriever::DocumentRetriever;
use super::types::{
    Answer, AnswerStream, ChatMessage, HealthStatus, QueryAnswer, QueryResult, SourceInfo,
    NO_CONTEXT_ANSWER,
};
use crate::core::config::{AppPaths, Settings};
use crate::core::errors::RagError;
use crate::ingest::{DocumentIngestion, IngestReport};
use crate::llm::{LlmProvider, OllamaProvider};
use crate::store::{ChunkSearchResult, SqliteVectorStore, VectorStore};

/// Source previews are truncated to this many characters.
const SOURCE_PREVIEW_CHARS: usize = 200;

pub struct RagPipeline {
    settings: Settings,
    store: Arc<dyn VectorStore>,
    retriever: DocumentRetriever,
    generator: ResponseGenerator,
    ingestion: DocumentIngestion,
}

impl RagPipeline {
    /// Wire the production pipeline: Ollama endpoint plus the SQLite-backed
    /// collection under `paths.index_dir`. Failure to open the collection is
    /// the one fatal startup error; everything downstream degrades softly.
    pub async fn new(settings: Settings, paths: &AppPaths) -> Result<Self, RagError> {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(OllamaProvider::new(settings.ollama_base_url.clone()));
        let store: Arc<dyn VectorStore> = Arc::new(
            SqliteVectorStore::open(paths.collection_db(&settings.collection_name)).await?,
        );

        Self::from_parts(settings, store, provider, paths.raw_dir.clone()).await
    }

    /// Wire the pipeline from pre-built collaborators.
    pub async fn from_parts(
        settings: Settings,
        store: Arc<dyn VectorStore>,
        provider: Arc<dyn LlmProvider>,
        raw_dir: std::path::PathBuf,
    ) -> Result<Self, RagError> {
        let retriever = DocumentRetriever::new(store.clone(), provider.clone(), &settings).await?;
        let generator = ResponseGenerator::new(provider.clone(), settings.llm_model.clone());
        let ingestion = DocumentIngestion::new(store.clone(), provider, &settings, raw_dir);

        Ok(Self {
            settings,
            store,
            retriever,
            generator,
            ingestion,
        })
    }

    /// Run document ingestion. `Ok(None)` means the raw directory was empty.
    pub async fn ingest_documents(&self) -> Result<Option<IngestReport>, RagError> {
        self.ingestion.process_and_store().await
    }

    /// Answer a question with a streamed response.
    ///
    /// Never returns an error: empty retrieval yields the fixed no-context
    /// sentinel, generation failures yield a one-fragment apology stream.
    pub async fn query_stream(
        &self,
        question: &str,
        chat_history: &[ChatMessage],
        k: Option<usize>,
    ) -> QueryResult {
        let k = k.unwrap_or(self.settings.top_k);
        let relevant_docs = self.retriever.retrieve_documents(question, k).await;

        if relevant_docs.is_empty() {
            return QueryResult {
                answer: Answer::NoContext(AnswerStream::of(NO_CONTEXT_ANSWER)),
                sources: Vec::new(),
                num_sources: 0,
            };
        }

        let sources = materialize_sources(&relevant_docs);
        let answer = self
            .generator
            .generate_response_stream(question, &relevant_docs, chat_history)
            .await;

        QueryResult {
            num_sources: sources.len(),
            sources,
            answer,
        }
    }

    /// Non-streaming variant of [`query_stream`].
    pub async fn query(
        &self,
        question: &str,
        chat_history: &[ChatMessage],
        k: Option<usize>,
    ) -> QueryAnswer {
        let k = k.unwrap_or(self.settings.top_k);
        let relevant_docs = self.retriever.retrieve_documents(question, k).await;

        if relevant_docs.is_empty() {
            return QueryAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                num_sources: 0,
            };
        }

        let sources = materialize_sources(&relevant_docs);
        let answer = self
            .generator
            .generate_response(question, &relevant_docs, chat_history)
            .await;

        QueryAnswer {
            answer,
            num_sources: sources.len(),
            sources,
        }
    }

    /// Check component health. Never fails; probe errors read as `false`.
    pub async fn health_check(&self) -> HealthStatus {
        let retrieval = self.store.count().await.is_ok();
        let generation = self.generator.probe().await;

        HealthStatus {
            // Ingestion needs no standing resources; it is checked when run.
            ingestion: true,
            retrieval,
            generation,
        }
    }
}

fn materialize_sources(relevant_docs: &[ChunkSearchResult]) -> Vec<SourceInfo> {
    relevant_docs
        .iter()
        .map(|result| SourceInfo {
            content: preview(&result.chunk.content),
            source: result.chunk.source.clone(),
            page: result.chunk.page,
        })
        .collect()
}

fn preview(content: &str) -> String {
    if content.chars().count() > SOURCE_PREVIEW_CHARS {
        let truncated: String = content.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}
