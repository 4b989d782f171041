use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_loaded: AtomicU64,
    documents_skipped: AtomicU64,
    chunks_indexed: AtomicU64,
    rebuilds_completed: AtomicU64,
    answers_served: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed rebuild and the work it performed.
    pub fn record_rebuild(&self, documents: u64, skipped: u64, chunks: u64) {
        self.documents_loaded.fetch_add(documents, Ordering::Relaxed);
        self.documents_skipped.fetch_add(skipped, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunks, Ordering::Relaxed);
        self.rebuilds_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully served answer.
    pub fn record_answer(&self) {
        self.answers_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_loaded: self.documents_loaded.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            rebuilds_completed: self.rebuilds_completed.load(Ordering::Relaxed),
            answers_served: self.answers_served.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of document records loaded across all rebuilds.
    pub documents_loaded: u64,
    /// Number of source objects skipped (unrecognized, blank, or failed).
    pub documents_skipped: u64,
    /// Total chunk count written to the vector store.
    pub chunks_indexed: u64,
    /// Number of successful index rebuilds since startup.
    pub rebuilds_completed: u64,
    /// Number of answers served since startup.
    pub answers_served: u64,
}
