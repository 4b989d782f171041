//! Index building: embedding chunks and writing them to the vector store.

use crate::embedding::Embedder;
use crate::pipeline::store::VectorIndex;
use crate::pipeline::types::{Chunk, PipelineError};
use crate::qdrant::{PointInsert, compute_chunk_hash};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of one index build.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOutcome {
    /// Points written to the collection.
    pub items_indexed: usize,
    /// Chunks skipped within the batch due to duplicate text.
    pub skipped_duplicates: usize,
}

/// Embeds chunks and upserts them into the collection as one batch.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    embedding_dimension: usize,
}

impl IndexBuilder {
    /// Wire the embedding capability to the target collection.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        embedding_dimension: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_dimension,
        }
    }

    /// Embed and persist the supplied chunks.
    ///
    /// The whole batch fails on an embedding or store error; no partial
    /// write is reported as success, and no retry happens here.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<IndexOutcome, PipelineError> {
        let (prepared, skipped_duplicates) = dedupe_chunks(chunks);
        if prepared.is_empty() {
            return Ok(IndexOutcome {
                items_indexed: 0,
                skipped_duplicates,
            });
        }

        let texts: Vec<String> = prepared.iter().map(|(chunk, _)| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_documents(texts).await?;

        if let Some(vector) = embeddings.first()
            && vector.len() != self.embedding_dimension
        {
            return Err(PipelineError::DimensionMismatch {
                expected: self.embedding_dimension,
                actual: vector.len(),
            });
        }
        debug_assert_eq!(prepared.len(), embeddings.len());

        let points: Vec<PointInsert> = prepared
            .into_iter()
            .zip(embeddings)
            .map(|((chunk, chunk_hash), vector)| PointInsert {
                text: chunk.text,
                metadata: chunk.metadata,
                chunk_hash,
                vector,
            })
            .collect();

        let items_indexed = self.index.upsert(points).await?;
        tracing::info!(items_indexed, skipped_duplicates, "Index build complete");

        Ok(IndexOutcome {
            items_indexed,
            skipped_duplicates,
        })
    }
}

/// Remove duplicate chunk texts within a batch, keeping the first occurrence.
fn dedupe_chunks(chunks: Vec<Chunk>) -> (Vec<(Chunk, String)>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for chunk in chunks {
        if chunk.text.trim().is_empty() {
            continue;
        }
        let hash = compute_chunk_hash(&chunk.text);
        if seen.insert(hash.clone()) {
            prepared.push((chunk, hash));
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceMetadata;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: SourceMetadata {
                source: "notes.txt".into(),
                page: None,
            },
        }
    }

    #[test]
    fn dedupe_chunks_removes_duplicates_and_counts_skips() {
        let chunks = vec![chunk("alpha"), chunk("beta"), chunk("alpha"), chunk("beta")];
        let (deduped, skipped) = dedupe_chunks(chunks);
        assert_eq!(deduped.len(), 2);
        assert_eq!(skipped, 2);
        assert_ne!(deduped[0].1, deduped[1].1);
    }

    #[test]
    fn dedupe_chunks_drops_blank_text() {
        let (deduped, skipped) = dedupe_chunks(vec![chunk("  "), chunk("alpha")]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(skipped, 0);
    }
}
