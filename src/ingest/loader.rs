//! Type-dispatched document loading.
//!
//! Walks the raw-documents directory recursively and loads every file with a
//! supported extension. Unsupported extensions are skipped with a warning;
//! unreadable files are logged and skipped. Neither aborts the batch.

use std::fs;
use std::io::Read;
use std::path::Path;

use walkdir::WalkDir;

use super::{DocMetadata, Document};
use crate::core::errors::RagError;

/// Load all documents under `raw_dir`.
pub fn load_documents(raw_dir: &Path) -> Vec<Document> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(raw_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let source = path
            .strip_prefix(raw_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let loaded = match extension.as_str() {
            "txt" => load_text(path, &source),
            "pdf" => load_pdf(path, &source),
            "doc" | "docx" => load_docx(path, &source),
            _ => {
                tracing::warn!("Unsupported file type, skipping: {}", path.display());
                continue;
            }
        };

        match loaded {
            Ok(docs) => {
                tracing::info!("Loaded {} document(s) from {}", docs.len(), path.display());
                documents.extend(docs);
            }
            Err(e) => {
                tracing::error!("Error loading {}: {}", path.display(), e);
            }
        }
    }

    documents
}

fn load_text(path: &Path, source: &str) -> Result<Vec<Document>, RagError> {
    let content = fs::read_to_string(path).map_err(RagError::load)?;

    Ok(vec![Document {
        content,
        metadata: DocMetadata {
            source: source.to_string(),
            page: None,
        },
    }])
}

/// One document per page, mirroring how paginated sources are cited.
fn load_pdf(path: &Path, source: &str) -> Result<Vec<Document>, RagError> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(RagError::load)?;

    Ok(pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| Document {
            content: text,
            metadata: DocMetadata {
                source: source.to_string(),
                page: Some(i as u32 + 1),
            },
        })
        .collect())
}

fn load_docx(path: &Path, source: &str) -> Result<Vec<Document>, RagError> {
    let file = fs::File::open(path).map_err(RagError::load)?;
    let mut archive = zip::ZipArchive::new(file).map_err(RagError::load)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(RagError::load)?
        .read_to_string(&mut xml)
        .map_err(RagError::load)?;

    let content = plaintext_from_docx_xml(&xml);

    Ok(vec![Document {
        content,
        metadata: DocMetadata {
            source: source.to_string(),
            page: None,
        },
    }])
}

/// Extract plain text from WordprocessingML.
///
/// Paragraph closes become line breaks; every other tag is dropped; the five
/// predefined XML entities are decoded.
fn plaintext_from_docx_xml(xml: &str) -> String {
    let with_breaks = xml.replace("</w:p>", "\n");

    let mut result = String::new();
    let mut in_tag = false;
    for c in with_breaks.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    let decoded = result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");

    let lines: Vec<&str> = decoded
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_txt_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir_all(&nested).unwrap();

        fs::write(dir.path().join("a.txt"), "first document").unwrap();
        fs::write(nested.join("b.txt"), "second document").unwrap();

        let mut docs = load_documents(dir.path());
        docs.sort_by(|a, b| a.metadata.source.cmp(&b.metadata.source));

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "first document");
        assert_eq!(docs[0].metadata.source, "a.txt");
        assert!(docs[1].metadata.source.ends_with("b.txt"));
    }

    #[test]
    fn skips_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("note.txt"), "kept").unwrap();

        let docs = load_documents(dir.path());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "kept");
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // Invalid UTF-8 makes read_to_string fail.
        let mut f = fs::File::create(dir.path().join("bad.txt")).unwrap();
        f.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("good.txt"), "still loaded").unwrap();

        let docs = load_documents(dir.path());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "still loaded");
    }

    #[test]
    fn docx_xml_plaintext_extraction() {
        let xml = r#"<?xml version="1.0"?>
<w:document><w:body>
<w:p><w:r><w:t>First paragraph &amp; more.</w:t></w:r></w:p>
<w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
</w:body></w:document>"#;

        let text = plaintext_from_docx_xml(xml);
        assert_eq!(text, "First paragraph & more.\nSecond paragraph.");
    }
}
