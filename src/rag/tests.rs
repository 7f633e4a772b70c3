use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{Answer, ChatMessage, NO_CONTEXT_ANSWER};
use super::RagPipeline;
use crate::core::config::Settings;
use crate::core::errors::RagError;
use crate::llm::{GenerateRequest, LlmProvider};
use crate::store::{SqliteVectorStore, VectorStore};

/// Deterministic provider: embeddings are character histograms, answers are
/// fixed strings. Failure modes are switchable per concern.
struct MockProvider {
    fail_embeddings: bool,
    fail_generation: bool,
    stream_fragments: Vec<String>,
    stream_cancelled: Arc<AtomicBool>,
}

impl MockProvider {
    fn healthy() -> Self {
        Self {
            fail_embeddings: false,
            fail_generation: false,
            stream_fragments: vec!["mock ".to_string(), "answer".to_string()],
            stream_cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failing_generation() -> Self {
        Self {
            fail_generation: true,
            ..Self::healthy()
        }
    }

    fn unreachable() -> Self {
        Self {
            fail_embeddings: true,
            fail_generation: true,
            ..Self::healthy()
        }
    }

    fn mock_embedding(text: &str) -> Vec<f32> {
        let mut histogram = vec![0.0f32; 16];
        for c in text.chars() {
            histogram[(c as usize) % 16] += 1.0;
        }
        histogram
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        Ok(!self.fail_generation)
    }

    async fn generate(&self, _request: GenerateRequest, _model: &str) -> Result<String, RagError> {
        if self.fail_generation {
            return Err(RagError::Llm("model endpoint unreachable".to_string()));
        }
        Ok("mock answer".to_string())
    }

    async fn stream_generate(
        &self,
        _request: GenerateRequest,
        _model: &str,
    ) -> Result<mpsc::Receiver<Result<String, RagError>>, RagError> {
        if self.fail_generation {
            return Err(RagError::Llm("model endpoint unreachable".to_string()));
        }

        let (tx, rx) = mpsc::channel(1);
        let fragments = self.stream_fragments.clone();
        let cancelled = self.stream_cancelled.clone();
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    cancelled.store(true, Ordering::SeqCst);
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn embed(&self, inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>, RagError> {
        if self.fail_embeddings {
            return Err(RagError::Llm("embedding endpoint unreachable".to_string()));
        }
        Ok(inputs.iter().map(|s| Self::mock_embedding(s)).collect())
    }
}

async fn temp_store() -> Arc<dyn VectorStore> {
    let path = std::env::temp_dir().join(format!("askdocs-pipeline-{}.db", uuid::Uuid::new_v4()));
    Arc::new(SqliteVectorStore::open(path).await.unwrap())
}

async fn pipeline_with(provider: MockProvider, raw_dir: PathBuf) -> RagPipeline {
    let store = temp_store().await;
    RagPipeline::from_parts(Settings::default(), store, Arc::new(provider), raw_dir)
        .await
        .unwrap()
}

fn empty_raw_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    (dir, path)
}

fn seeded_raw_dir(content: &str) -> (tempfile::TempDir, PathBuf) {
    let (dir, path) = empty_raw_dir();
    std::fs::write(path.join("doc.txt"), content).unwrap();
    (dir, path)
}

fn corpus_text() -> String {
    "The reactor manual describes the cooling loop in detail. ".repeat(53) // ~3000 chars
}

#[tokio::test]
async fn empty_collection_yields_the_no_context_sentinel() {
    let (_guard, raw) = empty_raw_dir();
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let result = pipeline.query_stream("anything?", &[], None).await;

    assert!(matches!(result.answer, Answer::NoContext(_)));
    assert!(result.sources.is_empty());
    assert_eq!(result.num_sources, 0);
    assert_eq!(result.answer.into_stream().collect().await, NO_CONTEXT_ANSWER);
}

#[tokio::test]
async fn ingest_then_query_end_to_end() {
    let (_guard, raw) = seeded_raw_dir(&corpus_text());
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let report = pipeline.ingest_documents().await.unwrap().unwrap();
    assert_eq!(report.documents, 1);
    assert!(report.chunks_added >= 3);
    assert_eq!(report.total_chunks, report.chunks_added);

    let result = pipeline
        .query_stream("What does the manual say about the cooling loop?", &[], None)
        .await;

    assert!(result.num_sources >= 1);
    assert!(matches!(result.answer, Answer::Generated(_)));
    let answer = result.answer.into_stream().collect().await;
    assert_eq!(answer, "mock answer");
}

#[tokio::test]
async fn reingesting_an_unchanged_corpus_doubles_the_chunk_count() {
    // Current behavior, not a goal: there is no content dedup.
    let (_guard, raw) = seeded_raw_dir(&corpus_text());
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let first = pipeline.ingest_documents().await.unwrap().unwrap();
    let second = pipeline.ingest_documents().await.unwrap().unwrap();

    assert_eq!(second.chunks_added, first.chunks_added);
    assert_eq!(second.total_chunks, first.total_chunks * 2);
}

#[tokio::test]
async fn empty_raw_directory_is_a_noop_not_an_error() {
    let (_guard, raw) = empty_raw_dir();
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let report = pipeline.ingest_documents().await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn generation_failure_degrades_to_a_one_fragment_apology() {
    let (_guard, raw) = seeded_raw_dir(&corpus_text());
    let pipeline = pipeline_with(MockProvider::failing_generation(), raw).await;
    pipeline.ingest_documents().await.unwrap().unwrap();

    let result = pipeline.query_stream("cooling loop?", &[], None).await;

    assert!(result.answer.is_degraded());
    assert!(result.num_sources >= 1, "sources are still materialized");

    let mut stream = result.answer.into_stream();
    let fragment = stream.next().await.unwrap();
    assert!(fragment.starts_with("I apologize, but I encountered an error"));
    assert!(stream.next().await.is_none(), "exactly one fragment");
}

#[tokio::test]
async fn unreachable_endpoint_still_returns_a_query_result() {
    let (_guard, raw) = empty_raw_dir();
    let pipeline = pipeline_with(MockProvider::unreachable(), raw).await;

    // Embedding fails, retrieval absorbs it as "no results".
    let result = pipeline.query_stream("hello?", &[], None).await;

    assert!(matches!(result.answer, Answer::NoContext(_)));
    assert!(result.sources.is_empty());
}

#[tokio::test]
async fn non_streaming_query_uses_the_same_sentinels() {
    let (_guard, raw) = empty_raw_dir();
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let result = pipeline.query("anything?", &[], None).await;
    assert_eq!(result.answer, NO_CONTEXT_ANSWER);
    assert_eq!(result.num_sources, 0);
}

#[tokio::test]
async fn source_previews_are_truncated_to_200_chars() {
    let (_guard, raw) = seeded_raw_dir(&corpus_text());
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;
    pipeline.ingest_documents().await.unwrap().unwrap();

    let result = pipeline.query_stream("cooling loop?", &[], None).await;

    let long_preview = result
        .sources
        .iter()
        .find(|s| s.content.ends_with("..."))
        .expect("chunks are ~1000 chars, previews must be truncated");
    assert_eq!(long_preview.content.chars().count(), 203);
}

#[tokio::test]
async fn history_is_passed_through_without_being_mutated() {
    let (_guard, raw) = empty_raw_dir();
    let pipeline = pipeline_with(MockProvider::healthy(), raw).await;

    let history = vec![
        ChatMessage::user("hi"),
        ChatMessage::assistant("hello there"),
    ];
    let _ = pipeline.query_stream("next question", &history, None).await;

    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn health_check_reports_component_status() {
    let (_guard, raw) = empty_raw_dir();

    let healthy = pipeline_with(MockProvider::healthy(), raw.clone()).await;
    let status = healthy.health_check().await;
    assert!(status.ingestion);
    assert!(status.retrieval);
    assert!(status.generation);

    let degraded = pipeline_with(MockProvider::failing_generation(), raw).await;
    let status = degraded.health_check().await;
    assert!(status.retrieval);
    assert!(!status.generation);
}

#[tokio::test]
async fn dropping_the_stream_stops_the_producer() {
    let (_guard, raw) = seeded_raw_dir(&corpus_text());

    let provider = MockProvider {
        stream_fragments: vec!["x".to_string(); 500],
        ..MockProvider::healthy()
    };
    let cancelled = provider.stream_cancelled.clone();

    let pipeline = pipeline_with(provider, raw).await;
    pipeline.ingest_documents().await.unwrap().unwrap();

    let result = pipeline.query_stream("cooling loop?", &[], None).await;
    let mut stream = result.answer.into_stream();
    assert!(stream.next().await.is_some());
    drop(stream);

    // The forwarder's buffered channel drains, then the producer's send fails.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cancelled.load(Ordering::SeqCst));
}
