//! Document ingestion: load raw files, split into chunks, embed, store.

pub mod ingestion;
pub mod loader;
pub mod splitter;

use serde::{Deserialize, Serialize};

pub use ingestion::{DocumentIngestion, IngestReport};
pub use loader::load_documents;
pub use splitter::RecursiveCharacterSplitter;

/// Source metadata carried from a loaded file through to its stored chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Path of the source file, relative to the raw-documents directory.
    pub source: String,
    /// 1-based page number for paginated formats.
    pub page: Option<u32>,
}

/// A raw text document as produced by the loader.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: DocMetadata,
}

/// A bounded sub-span of a document, the unit stored in the collection.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocMetadata,
    /// Character offset of this chunk within the source document.
    pub start_offset: usize,
    /// Position of this chunk within the source document's chunk sequence.
    pub chunk_index: usize,
}
