use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_llm_model() -> String {
    "mistral".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_collection_name() -> String {
    "document_store".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    5
}

/// Pipeline configuration.
///
/// Resolution order: built-in defaults, then `config.yml` in the data root
/// if present, then `ASKDOCS_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            embedding_model: default_embedding_model(),
            llm_model: default_llm_model(),
            ollama_base_url: default_ollama_base_url(),
            collection_name: default_collection_name(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, then apply env overrides.
    pub fn load(config_path: &Path) -> Result<Self, RagError> {
        let mut settings = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| RagError::Config(format!("failed to read config: {}", e)))?;
            serde_yaml::from_str::<Settings>(&contents)
                .map_err(|e| RagError::Config(format!("invalid config: {}", e)))?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();

        if settings.chunk_overlap >= settings.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                settings.chunk_overlap, settings.chunk_size
            )));
        }

        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ASKDOCS_EMBEDDING_MODEL") {
            self.embedding_model = val;
        }
        if let Ok(val) = env::var("ASKDOCS_LLM_MODEL") {
            self.llm_model = val;
        }
        if let Ok(val) = env::var("ASKDOCS_OLLAMA_BASE_URL") {
            self.ollama_base_url = val;
        }
        if let Ok(val) = env::var("ASKDOCS_COLLECTION_NAME") {
            self.collection_name = val;
        }
        if let Ok(val) = env::var("ASKDOCS_CHUNK_SIZE") {
            if let Ok(parsed) = val.parse() {
                self.chunk_size = parsed;
            }
        }
        if let Ok(val) = env::var("ASKDOCS_CHUNK_OVERLAP") {
            if let Ok(parsed) = val.parse() {
                self.chunk_overlap = parsed;
            }
        }
        if let Ok(val) = env::var("ASKDOCS_TOP_K") {
            if let Ok(parsed) = val.parse() {
                self.top_k = parsed;
            }
        }
    }
}
