//! Core data types and error definitions for the pipeline.

use crate::loader::SourceMetadata;
use crate::qdrant::QdrantError;
use thiserror::Error;

/// A bounded slice of a document's text, the unit of retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk text, at most `chunk_size` characters.
    pub text: String,
    /// Provenance copied unchanged from the source record.
    pub metadata: SourceMetadata,
}

/// A retrieved chunk with its similarity score, ranked descending.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Stored chunk text.
    pub text: String,
    /// Similarity score reported by the store.
    pub score: f32,
    /// Blob the chunk came from, if recorded.
    pub source: Option<String>,
    /// Page or slide number, if recorded.
    pub page: Option<usize>,
}

/// Counts reported by a completed rebuild.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RebuildReport {
    /// Document records extracted from the container.
    pub documents_processed: usize,
    /// Source objects skipped (unrecognized, blank, or failed).
    pub documents_skipped: usize,
    /// Chunks produced by the splitter.
    pub chunks_created: usize,
    /// Points written to the vector store.
    pub items_indexed: usize,
}

/// Errors produced while splitting records into chunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Window size of zero can never make progress.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for the window to advance.
    #[error("chunk overlap must be smaller than the chunk size")]
    InvalidOverlap,
}

/// Errors surfaced by pipeline operations, mirroring the failure taxonomy
/// the serving layer reports to callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Container or collection unreachable; the previous state is retained.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    /// Splitting failed due to caller misuse.
    #[error("Failed to chunk documents: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed during build or answer.
    #[error("Embedding failed: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingError),
    /// Generation provider failed while composing an answer.
    #[error("Generation failed: {0}")]
    Generation(#[from] crate::generation::GenerationError),
    /// Returned embedding dimension does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the collection.
        expected: usize,
        /// Dimension the provider actually produced.
        actual: usize,
    },
    /// `answer()` or `rebuild()` called before any successful build.
    #[error("Pipeline not initialized; trigger a data refresh first")]
    NotInitialized,
    /// A rebuild was requested while another is in flight.
    #[error("A rebuild is already in progress")]
    RebuildInProgress,
}

impl From<QdrantError> for PipelineError {
    fn from(error: QdrantError) -> Self {
        Self::SourceUnavailable(error.to_string())
    }
}

impl From<crate::blobstore::BlobStoreError> for PipelineError {
    fn from(error: crate::blobstore::BlobStoreError) -> Self {
        Self::SourceUnavailable(error.to_string())
    }
}
