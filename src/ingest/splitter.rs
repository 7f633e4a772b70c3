//! Recursive character splitter.
//!
//! Splits text into overlapping windows of at most `chunk_size` characters,
//! snapping each cut to the best available boundary: paragraph break first,
//! then line break, then sentence end, then word boundary, then a raw
//! character cut. Counts are `char`s, not bytes.

use super::{Chunk, DocMetadata, Document};

/// Boundary separators in preference order.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_size > 0);
        assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split every document, preserving per-document chunk ordering.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.content.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total {
            let window_end = (start + self.chunk_size).min(total);
            let end = if window_end < total {
                self.snap_to_boundary(&chars, start, window_end)
            } else {
                window_end
            };

            let content: String = chars[start..end].iter().collect();
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    content: content.clone(),
                    metadata: document.metadata.clone(),
                    start_offset: start,
                    chunk_index,
                });
                chunk_index += 1;
            }

            if end == total {
                break;
            }

            // Re-read the trailing `chunk_overlap` characters in the next window.
            start = (end.saturating_sub(self.chunk_overlap)).max(start + 1);
        }

        chunks
    }

    /// Find the latest boundary in the back half of the window.
    ///
    /// The cut lands just after the separator so sentence punctuation stays
    /// with the preceding chunk. Falls back to the raw window end when no
    /// separator appears late enough.
    fn snap_to_boundary(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let window: String = chars[start..window_end].iter().collect();
        let min_cut = (window_end - start) / 2;

        for sep in SEPARATORS {
            if let Some(byte_pos) = window.rfind(sep) {
                let char_pos = window[..byte_pos].chars().count() + sep.chars().count();
                if char_pos > min_cut && char_pos > self.chunk_overlap {
                    return start + char_pos;
                }
            }
        }

        window_end
    }
}
