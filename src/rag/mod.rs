//! The retrieval-augmented generation pipeline.
//!
//! A query moves through: retrieval against the persisted collection,
//! prompt construction with bounded chat history, then incremental answer
//! generation. Failures at every stage after startup resolve to synthetic
//! answer text rather than errors; chat continuity wins over strict error
//! surfacing.

pub mod generator;
pub mod pipeline;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

pub use generator::ResponseGenerator;
pub use pipeline::RagPipeline;
pub use retriever::DocumentRetriever;
pub use types::{
    Answer, AnswerStream, ChatMessage, HealthStatus, QueryAnswer, QueryResult, Role, SourceInfo,
    GENERATION_APOLOGY, NO_CONTEXT_ANSWER,
};
