use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("store error: {0}")]
    Store(String),
    #[error("llm error: {0}")]
    Llm(String),
    #[error("load error: {0}")]
    Load(String),
    #[error("config error: {0}")]
    Config(String),
}

impl RagError {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        RagError::Store(err.to_string())
    }

    pub fn llm<E: std::fmt::Display>(err: E) -> Self {
        RagError::Llm(err.to_string())
    }

    pub fn load<E: std::fmt::Display>(err: E) -> Self {
        RagError::Load(err.to_string())
    }
}
