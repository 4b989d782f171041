//! Live pipeline state and the rebuild path.
//!
//! The coordinator is the only writer of [`PipelineState`]. Answer calls
//! clone the current `Arc<QueryPipeline>` under a read lock and run against
//! that snapshot, so an in-flight rebuild never disturbs them and a swap is
//! observed entirely or not at all. Rebuilds are serialized with a
//! `try_lock` gate: a second concurrent trigger is rejected outright with
//! [`PipelineError::RebuildInProgress`] instead of queueing a duplicate
//! build against the same collection.

use crate::blobstore::BlobStoreError;
use crate::embedding::Embedder;
use crate::generation::{Generator, SamplingParams};
use crate::loader::{DocumentLoader, LoadSummary};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::pipeline::chunking::split_records;
use crate::pipeline::composer::{AnswerComposer, personalize_question};
use crate::pipeline::indexer::IndexBuilder;
use crate::pipeline::retriever::Retriever;
use crate::pipeline::store::VectorIndex;
use crate::pipeline::types::{PipelineError, RebuildReport};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Source of document records for a rebuild.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Extract a record sequence from the backing container.
    async fn load(&self) -> Result<LoadSummary, BlobStoreError>;
}

#[async_trait]
impl DocumentSource for DocumentLoader {
    async fn load(&self) -> Result<LoadSummary, BlobStoreError> {
        DocumentLoader::load(self).await
    }
}

/// Tunables fixed at process start.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Character window applied when splitting documents.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Dimensionality of the embedding vectors.
    pub embedding_dimension: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Optional minimum similarity score for retrieved chunks.
    pub score_threshold: Option<f32>,
    /// Sampling parameters for answer generation.
    pub sampling: SamplingParams,
}

/// The swappable (retriever, composer) pair serving answers.
pub struct QueryPipeline {
    retriever: Retriever,
    composer: AnswerComposer,
}

/// Lifecycle of the live pipeline.
pub enum PipelineState {
    /// No successful build has ever produced a pair.
    Uninitialized,
    /// A valid pair is serving answers.
    Ready(Arc<QueryPipeline>),
    /// The store was unreachable at construction time.
    Unavailable(String),
}

impl PipelineState {
    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready(_) => "ready",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Readiness view exposed through the health endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineHealth {
    /// Current state name: `ready`, `uninitialized`, or `unavailable`.
    pub state: String,
    /// Whether a (retriever, composer) pair is currently serving.
    pub pipeline_initialized: bool,
    /// Diagnostic captured when the store was unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the live pipeline state and mediates between the write path
/// (rebuild) and the read path (answer).
pub struct PipelineCoordinator {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn VectorIndex>,
    settings: PipelineSettings,
    state: RwLock<PipelineState>,
    rebuild_gate: Mutex<()>,
    metrics: Arc<PipelineMetrics>,
}

impl PipelineCoordinator {
    /// Wire the capabilities together; the pipeline starts uninitialized
    /// until [`Self::initialize`] or a successful rebuild runs.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: Arc<dyn VectorIndex>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            embedder,
            generator,
            index,
            settings,
            state: RwLock::new(PipelineState::Uninitialized),
            rebuild_gate: Mutex::new(()),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Probe the store and adopt the most recent successful build if the
    /// collection already exists. Distinguishes "never built" from "built
    /// but unreachable" so operators can tell the two apart.
    pub async fn initialize(&self) {
        let next = match self.index.probe().await {
            Ok(true) => {
                tracing::info!("Existing collection found; pipeline ready");
                PipelineState::Ready(Arc::new(self.build_query_pipeline()))
            }
            Ok(false) => {
                tracing::info!("No collection yet; pipeline awaiting first rebuild");
                PipelineState::Uninitialized
            }
            Err(error) => {
                tracing::error!(error = %error, "Vector store unreachable at startup");
                PipelineState::Unavailable(error.to_string())
            }
        };
        *self.state.write().await = next;
    }

    /// Answer a question with the currently serving pair.
    ///
    /// Read-only with respect to pipeline state; safe to run concurrently
    /// with other answers and with an in-flight rebuild, which it will not
    /// observe until the swap completes.
    pub async fn answer(
        &self,
        question: &str,
        user_name: Option<&str>,
    ) -> Result<String, PipelineError> {
        let pipeline = {
            let state = self.state.read().await;
            match &*state {
                PipelineState::Ready(pipeline) => Arc::clone(pipeline),
                PipelineState::Uninitialized => return Err(PipelineError::NotInitialized),
                PipelineState::Unavailable(reason) => {
                    return Err(PipelineError::SourceUnavailable(reason.clone()));
                }
            }
        };

        let question = personalize_question(question, user_name);
        let context = pipeline.retriever.search(&question).await?;
        tracing::debug!(chunks = context.len(), "Context retrieved");
        let answer = pipeline.composer.answer(&question, &context).await?;
        self.metrics.record_answer();
        Ok(answer)
    }

    /// Re-ingest the container and atomically swap in a fresh pair.
    ///
    /// At most one rebuild runs at a time; a concurrent trigger is rejected.
    /// On failure the previous pair keeps serving and the error is surfaced
    /// to the rebuild caller.
    pub async fn rebuild(&self) -> Result<RebuildReport, PipelineError> {
        let _gate = self
            .rebuild_gate
            .try_lock()
            .map_err(|_| PipelineError::RebuildInProgress)?;

        tracing::info!("Rebuild started");
        let summary = self.source.load().await?;
        self.index.ensure_ready().await?;

        let chunks = split_records(
            &summary.records,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        )?;
        let chunks_created = chunks.len();

        let builder = IndexBuilder::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.index),
            self.settings.embedding_dimension,
        );
        let outcome = builder.build(chunks).await?;

        let report = RebuildReport {
            documents_processed: summary.records.len(),
            documents_skipped: summary.objects_skipped,
            chunks_created,
            items_indexed: outcome.items_indexed,
        };

        // The swap is the only mutation of pipeline state.
        let pipeline = Arc::new(self.build_query_pipeline());
        *self.state.write().await = PipelineState::Ready(pipeline);

        self.metrics.record_rebuild(
            report.documents_processed as u64,
            report.documents_skipped as u64,
            report.items_indexed as u64,
        );
        tracing::info!(
            documents = report.documents_processed,
            skipped = report.documents_skipped,
            chunks = report.chunks_created,
            indexed = report.items_indexed,
            "Rebuild complete"
        );
        Ok(report)
    }

    /// Current readiness view for the health endpoint.
    pub async fn health(&self) -> PipelineHealth {
        let state = self.state.read().await;
        PipelineHealth {
            state: state.name().to_string(),
            pipeline_initialized: matches!(&*state, PipelineState::Ready(_)),
            error: match &*state {
                PipelineState::Unavailable(reason) => Some(reason.clone()),
                _ => None,
            },
        }
    }

    /// Current pipeline counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn build_query_pipeline(&self) -> QueryPipeline {
        QueryPipeline {
            retriever: Retriever::new(
                Arc::clone(&self.embedder),
                Arc::clone(&self.index),
                self.settings.embedding_dimension,
                self.settings.top_k,
                self.settings.score_threshold,
            ),
            composer: AnswerComposer::new(Arc::clone(&self.generator), self.settings.sampling),
        }
    }
}
