use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::GenerateRequest;
use crate::core::errors::RagError;

/// Model-serving endpoint used for both text generation and embeddings.
///
/// Retrieval correctness depends on `embed` being called with the same
/// embedding model at ingestion time and at query time.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the endpoint is reachable; network errors map to Ok(false)
    async fn health_check(&self) -> Result<bool, RagError>;

    /// completion (non-streaming)
    async fn generate(&self, request: GenerateRequest, model_id: &str) -> Result<String, RagError>;

    /// completion (streaming); fragments arrive in model emission order
    async fn stream_generate(
        &self,
        request: GenerateRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, RagError>>, RagError>;

    /// generate embeddings for a batch of inputs
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError>;
}
