use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::LlmProvider;
use super::types::GenerateRequest;
use crate::core::errors::RagError;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn options_body(request: &GenerateRequest) -> Value {
        let mut options = serde_json::Map::new();
        if let Some(t) = request.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = request.max_tokens {
            options.insert("num_predict".to_string(), json!(n));
        }
        if let Some(stop) = &request.stop {
            options.insert("stop".to_string(), json!(stop));
        }
        Value::Object(options)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn generate(&self, request: GenerateRequest, model_id: &str) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": model_id,
            "prompt": request.prompt,
            "stream": false,
            "options": Self::options_body(&request),
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("ollama generate error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;
        let content = payload["response"].as_str().unwrap_or_default().to_string();

        Ok(content)
    }

    async fn stream_generate(
        &self,
        request: GenerateRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, RagError>>, RagError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": model_id,
            "prompt": request.prompt,
            "stream": true,
            "options": Self::options_body(&request),
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("ollama stream error: {}", text)));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            // NDJSON lines may be split across byte chunks
            let mut carry = String::new();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        carry.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(pos) = carry.find('\n') {
                            let line = carry[..pos].trim().to_string();
                            carry.drain(..=pos);
                            if line.is_empty() {
                                continue;
                            }

                            let Ok(payload) = serde_json::from_str::<Value>(&line) else {
                                continue;
                            };

                            if let Some(fragment) = payload["response"].as_str() {
                                if !fragment.is_empty()
                                    && tx.send(Ok(fragment.to_string())).await.is_err()
                                {
                                    return;
                                }
                            }

                            if payload["done"].as_bool() == Some(true) {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(RagError::llm(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/api/embed", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::llm)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::Llm(format!("ollama embed error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(RagError::llm)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["embeddings"].as_array() {
            for item in data {
                if let Some(vals) = item.as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(RagError::Llm(format!(
                "ollama embed returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}
