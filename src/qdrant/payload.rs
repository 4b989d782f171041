//! Helpers for constructing and hashing Qdrant payloads.

use crate::loader::SourceMetadata;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(
    text: &str,
    metadata: &SourceMetadata,
    chunk_hash: &str,
    timestamp_rfc3339: &str,
) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(text.to_string()));
    payload.insert("source".into(), Value::String(metadata.source.clone()));
    if let Some(page) = metadata.page {
        payload.insert("page".into(), Value::from(page));
    }
    payload.insert("chunk_hash".into(), Value::String(chunk_hash.to_string()));
    payload.insert(
        "ingested_at".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for Qdrant points.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_hash_is_stable() {
        let text = "Hello world";
        let h1 = compute_chunk_hash(text);
        let h2 = compute_chunk_hash(text);
        assert_eq!(h1, h2);
        assert!(!h1.is_empty());
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn payload_carries_text_and_provenance() {
        let metadata = SourceMetadata {
            source: "handbook.pdf".into(),
            page: Some(3),
        };
        let payload = build_payload("sample", &metadata, "abc123", "2025-01-01T00:00:00Z");
        assert_eq!(payload["text"], "sample");
        assert_eq!(payload["source"], "handbook.pdf");
        assert_eq!(payload["page"], 3);
        assert_eq!(payload["chunk_hash"], "abc123");
        assert_eq!(payload["ingested_at"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn payload_omits_page_for_single_part_sources() {
        let metadata = SourceMetadata {
            source: "notes.txt".into(),
            page: None,
        };
        let payload = build_payload("sample", &metadata, "hash", "2025-01-01T00:00:00Z");
        assert!(payload.get("page").is_none());
    }
}
