//! Document loading: container enumeration, format dispatch, and extraction.
//!
//! The loader walks every blob in the configured container, infers a format
//! from the name, and extracts text through the matching handler. Individual
//! objects that fail to parse are logged and skipped so one corrupt file
//! cannot abort a rebuild; only container-level failures end the run. Each
//! object's bytes live in a named temp file for the duration of its
//! extraction and are removed when the handle drops.

pub mod extract;
pub mod ocr;
pub mod types;

pub use types::{DocFormat, DocumentRecord, ExtractError, LoadSummary, SourceMetadata};

use crate::blobstore::{BlobContainerClient, BlobStoreError, SourceObject};
use std::io::Write;

/// Loads and extracts source documents from the blob container.
pub struct DocumentLoader {
    client: BlobContainerClient,
}

impl DocumentLoader {
    /// Wrap a container client.
    pub fn new(client: BlobContainerClient) -> Self {
        Self { client }
    }

    /// Enumerate the container and extract a record sequence from every
    /// readable object. Fails only when the container itself is unreachable.
    pub async fn load(&self) -> Result<LoadSummary, BlobStoreError> {
        let names = self.client.list_blobs().await?;
        tracing::info!(objects = names.len(), "Loading documents from container");

        let mut summary = LoadSummary::default();
        for name in names {
            let format = DocFormat::from_name(&name);
            if format == DocFormat::Unrecognized {
                tracing::debug!(blob = %name, "Skipping unrecognized suffix");
                summary.objects_skipped += 1;
                continue;
            }

            let object = match self.client.fetch_blob(&name).await {
                Ok(object) => object,
                Err(error) => {
                    tracing::warn!(blob = %name, error = %error, "Failed to fetch blob; skipping");
                    summary.objects_skipped += 1;
                    continue;
                }
            };

            match extract_records(&object, format) {
                Ok(records) if records.is_empty() => {
                    tracing::debug!(blob = %name, "Object produced no text; skipping");
                    summary.objects_skipped += 1;
                }
                Ok(records) => {
                    tracing::debug!(blob = %name, records = records.len(), "Object extracted");
                    summary.objects_processed += 1;
                    summary.records.extend(records);
                }
                Err(error) => {
                    tracing::warn!(blob = %name, error = %error, "Extraction failed; skipping");
                    summary.objects_skipped += 1;
                }
            }
        }

        tracing::info!(
            records = summary.records.len(),
            processed = summary.objects_processed,
            skipped = summary.objects_skipped,
            "Container load complete"
        );
        Ok(summary)
    }
}

/// Extract records from one object via a scoped temp copy of its bytes.
fn extract_records(
    object: &SourceObject,
    format: DocFormat,
) -> Result<Vec<DocumentRecord>, ExtractError> {
    let suffix = suffix_of(&object.name);
    let mut temp = tempfile::Builder::new()
        .prefix("ragserve-")
        .suffix(&suffix)
        .tempfile()?;
    temp.write_all(&object.bytes)?;
    temp.flush()?;

    // The temp file is removed when `temp` drops, extraction outcome aside.
    let records = match format {
        DocFormat::Pdf => paged_records(&object.name, extract::extract_pdf(temp.path())?),
        DocFormat::Presentation => {
            paged_records(&object.name, extract::extract_presentation(temp.path())?)
        }
        DocFormat::Text => single_record(&object.name, extract::extract_text_file(temp.path())?),
        DocFormat::Image => single_record(&object.name, ocr::ocr_image(temp.path())?),
        DocFormat::Unrecognized => Vec::new(),
    };

    Ok(records)
}

/// One record per non-blank page or slide, numbered from 1.
fn paged_records(source: &str, pages: Vec<String>) -> Vec<DocumentRecord> {
    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| DocumentRecord {
            text,
            metadata: SourceMetadata {
                source: source.to_string(),
                page: Some(idx + 1),
            },
        })
        .collect()
}

/// A single record when the extracted text is non-blank, nothing otherwise.
fn single_record(source: &str, text: String) -> Vec<DocumentRecord> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    vec![DocumentRecord {
        text,
        metadata: SourceMetadata {
            source: source.to_string(),
            page: None,
        },
    }]
}

fn suffix_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_string(),
        None => String::new(),
    }
}
