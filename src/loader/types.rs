//! Core data types for document loading.

use thiserror::Error;

/// Formats the loader knows how to extract, inferred from the blob suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// `.pdf` documents, extracted page by page.
    Pdf,
    /// `.pptx` presentations, extracted slide by slide.
    Presentation,
    /// `.txt` plain-text documents.
    Text,
    /// `.png`/`.jpg`/`.jpeg` images, extracted via OCR.
    Image,
    /// Any other suffix; skipped without error.
    Unrecognized,
}

impl DocFormat {
    /// Infer the format from a blob name. Image suffixes match
    /// case-insensitively; the remaining suffixes match exactly.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".pdf") {
            return Self::Pdf;
        }
        if name.ends_with(".pptx") {
            return Self::Presentation;
        }
        if name.ends_with(".txt") {
            return Self::Text;
        }
        let lowered = name.to_lowercase();
        if lowered.ends_with(".png") || lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
            return Self::Image;
        }
        Self::Unrecognized
    }
}

/// Provenance attached to every record and inherited by its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Blob name the text was extracted from.
    pub source: String,
    /// Page or slide number (1-based) for multi-part documents.
    pub page: Option<usize>,
}

/// A unit of extracted text together with its provenance.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Extracted text content.
    pub text: String,
    /// Provenance metadata.
    pub metadata: SourceMetadata,
}

/// Outcome of a full container load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Records extracted across all objects, in enumeration order.
    pub records: Vec<DocumentRecord>,
    /// Objects that produced at least one record.
    pub objects_processed: usize,
    /// Objects skipped: unrecognized suffix, blank content, or failed extraction.
    pub objects_skipped: usize,
}

/// Errors raised while extracting text from a single object.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// PDF parsing failed.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    /// Presentation archive or XML parsing failed.
    #[error("Presentation extraction failed: {0}")]
    Presentation(String),
    /// Plain-text decoding failed.
    #[error("Text extraction failed: {0}")]
    Io(#[from] std::io::Error),
    /// OCR engine was unavailable or failed on the image.
    #[error("OCR failed: {0}")]
    Ocr(String),
}
