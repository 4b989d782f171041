//! Ingestion and retrieval pipeline: chunking, indexing, retrieval, answer
//! composition, and the coordinator that owns the live pair.

pub mod chunking;
pub mod composer;
pub mod coordinator;
pub mod indexer;
pub mod retriever;
pub mod store;
pub mod types;

pub use chunking::split_records;
pub use composer::AnswerComposer;
pub use coordinator::{
    DocumentSource, PipelineCoordinator, PipelineHealth, PipelineSettings, PipelineState,
};
pub use indexer::{IndexBuilder, IndexOutcome};
pub use retriever::Retriever;
pub use store::{QdrantIndex, VectorIndex};
pub use types::{Chunk, ChunkingError, PipelineError, RebuildReport, ScoredChunk};
