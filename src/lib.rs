//! askdocs: a local retrieval-augmented generation pipeline.
//!
//! Ingests documents from a raw-documents directory, indexes them in a
//! persisted vector collection, and answers questions by retrieving relevant
//! chunks and streaming a model-generated answer grounded in them.

pub mod core;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod store;

pub use crate::core::config::{AppPaths, Settings};
pub use crate::core::errors::RagError;
pub use rag::{ChatMessage, QueryResult, RagPipeline, Role};
