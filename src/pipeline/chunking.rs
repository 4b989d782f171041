//! Sliding-window document splitting.
//!
//! Chunks are fixed character windows with a fixed overlap between
//! neighbors, sliced on char boundaries so multi-byte text cannot split a
//! code point. Dropping the first `overlap` characters of every chunk after
//! the first reconstructs the record's text exactly; the tests hold the
//! pipeline to that.

use crate::loader::DocumentRecord;
use crate::pipeline::types::{Chunk, ChunkingError};

/// Split records into overlapping character windows, copying each record's
/// metadata onto its chunks. Records with blank text produce no chunks.
pub fn split_records(
    records: &[DocumentRecord],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    validate(chunk_size, chunk_overlap)?;

    let mut chunks = Vec::new();
    for record in records {
        for text in window_text(&record.text, chunk_size, chunk_overlap) {
            chunks.push(Chunk {
                text,
                metadata: record.metadata.clone(),
            });
        }
    }
    Ok(chunks)
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<(), ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if chunk_overlap >= chunk_size {
        return Err(ChunkingError::InvalidOverlap);
    }
    Ok(())
}

/// Produce the window texts for one record.
fn window_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the text.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    boundaries.push(text.len());
    let char_count = boundaries.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        windows.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start = end - chunk_overlap;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceMetadata;

    fn record(text: &str) -> DocumentRecord {
        DocumentRecord {
            text: text.to_string(),
            metadata: SourceMetadata {
                source: "notes.txt".into(),
                page: None,
            },
        }
    }

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            if idx == 0 {
                out.push_str(&chunk.text);
            } else {
                out.extend(chunk.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn short_record_yields_single_chunk() {
        let records = vec![record("Paris is the capital of France.")];
        let chunks = split_records(&records, 1000, 150).expect("chunks");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
        assert_eq!(chunks[0].metadata.source, "notes.txt");
    }

    #[test]
    fn chunks_respect_window_size_and_overlap() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let records = vec![record(&text)];
        let chunks = split_records(&records, 1000, 150).expect("chunks");

        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count() - 150)
                .collect();
            let head: String = pair[1].text.chars().take(150).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn dropping_overlap_reconstructs_the_record() {
        let text: String = ('a'..='z').cycle().take(3217).collect();
        let records = vec![record(&text)];
        let chunks = split_records(&records, 1000, 150).expect("chunks");
        assert_eq!(reconstruct(&chunks, 150), text);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text: String = "héllo wörld ".repeat(300);
        let records = vec![record(&text)];
        let chunks = split_records(&records, 100, 20).expect("chunks");
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks, 20), text);
    }

    #[test]
    fn blank_record_produces_no_chunks() {
        let records = vec![record("   \n\t ")];
        let chunks = split_records(&records, 1000, 150).expect("chunks");
        assert!(chunks.is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let records = vec![record("text")];
        assert_eq!(
            split_records(&records, 0, 0).unwrap_err(),
            ChunkingError::InvalidChunkSize
        );
        assert_eq!(
            split_records(&records, 100, 100).unwrap_err(),
            ChunkingError::InvalidOverlap
        );
    }

    #[test]
    fn metadata_is_copied_onto_every_chunk() {
        let text: String = "x".repeat(2100);
        let records = vec![DocumentRecord {
            text,
            metadata: SourceMetadata {
                source: "deck.pptx".into(),
                page: Some(4),
            },
        }];
        let chunks = split_records(&records, 1000, 150).expect("chunks");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata.source, "deck.pptx");
            assert_eq!(chunk.metadata.page, Some(4));
        }
    }
}
