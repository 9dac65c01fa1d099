//! Document loading for knowledge-base uploads.
//!
//! Turns uploaded bytes into source fragments (one per text file, one per
//! non-blank PDF page) and chunks them for embedding.

use crate::chunker::Chunker;
use smartflow_core::error::MemoryError;
use smartflow_core::memory::{Fragment, FragmentMetadata};
use std::path::Path;

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".txt", ".md"];

pub struct DocumentProcessor {
    chunker: Chunker,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: Chunker::with_size(chunk_size, chunk_overlap),
        }
    }

    /// Whether `filename` has an accepted extension (case-insensitive).
    pub fn is_supported(filename: &str) -> bool {
        let lower = filename.to_lowercase();
        ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Load raw upload bytes and return chunked fragments.
    pub fn load_bytes(&self, content: &[u8], filename: &str) -> Result<Vec<Fragment>, MemoryError> {
        let pages = match extension(filename).as_str() {
            ".txt" | ".md" => vec![Fragment::new(
                String::from_utf8_lossy(content),
                FragmentMetadata::source(filename),
            )],
            ".pdf" => pdf_pages(content, filename)?,
            other => return Err(MemoryError::UnsupportedDocument(other.to_string())),
        };

        let chunks = self.chunker.split_fragments(&pages);
        tracing::debug!(
            filename,
            pages = pages.len(),
            chunks = chunks.len(),
            "Document split into chunks"
        );
        Ok(chunks)
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

/// Lowercased extension with its leading dot, or empty.
fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Extract text per page. Pages are delimited by form feeds; blank pages
/// are skipped but still count toward numbering.
fn pdf_pages(content: &[u8], filename: &str) -> Result<Vec<Fragment>, MemoryError> {
    let text = pdf_extract::extract_text_from_mem(content).map_err(|e| {
        MemoryError::DocumentParse {
            filename: filename.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(text
        .split('\x0C')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| {
            Fragment::new(
                page,
                FragmentMetadata::source(filename).with_page(i as u32 + 1),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(extension("Report.PDF"), ".pdf");
        assert_eq!(extension("notes.md"), ".md");
        assert_eq!(extension("README"), "");
        assert!(DocumentProcessor::is_supported("guide.TXT"));
        assert!(!DocumentProcessor::is_supported("sheet.xlsx"));
    }

    #[test]
    fn text_upload_is_chunked_with_source() {
        let processor = DocumentProcessor::new(10, 0);
        let chunks = processor
            .load_bytes("第一段。\n\n第二段内容。".as_bytes(), "faq.md")
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.metadata.source.as_deref() == Some("faq.md")));
        assert!(chunks.iter().all(|c| c.metadata.page.is_none()));
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let chunks = DocumentProcessor::default()
            .load_bytes(&[b'o', b'k', 0xFF, b'!'], "raw.txt")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.starts_with("ok"));
    }

    #[test]
    fn unsupported_extension_is_error() {
        let err = DocumentProcessor::default()
            .load_bytes(b"data", "table.csv")
            .unwrap_err();
        assert!(matches!(err, MemoryError::UnsupportedDocument(ref ext) if ext == ".csv"));
    }

    #[test]
    fn corrupt_pdf_is_parse_error() {
        let err = DocumentProcessor::default()
            .load_bytes(b"not a pdf", "broken.pdf")
            .unwrap_err();
        assert!(matches!(err, MemoryError::DocumentParse { .. }));
    }
}
