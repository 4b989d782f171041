//! Vector index capability interface and the Qdrant-backed implementation.

use crate::qdrant::{PointInsert, QdrantError, QdrantService, ScoredPoint};
use async_trait::async_trait;
use std::sync::Arc;

/// Narrow interface over the persistent vector collection so any concrete
/// store (or a test fake) can back the pipeline.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether the backing collection already exists.
    async fn probe(&self) -> Result<bool, QdrantError>;

    /// Create the backing collection when missing.
    async fn ensure_ready(&self) -> Result<(), QdrantError>;

    /// Write points durably; every point is queryable once this returns.
    async fn upsert(&self, points: Vec<PointInsert>) -> Result<usize, QdrantError>;

    /// Top-`k` similarity search, optionally threshold-filtered.
    async fn search(
        &self,
        vector: Vec<f32>,
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>, QdrantError>;
}

/// Qdrant collection bound to a name and vector size.
pub struct QdrantIndex {
    service: Arc<QdrantService>,
    collection: String,
    vector_size: u64,
}

impl QdrantIndex {
    /// Bind a service handle to a named collection.
    pub fn new(service: Arc<QdrantService>, collection: String, vector_size: u64) -> Self {
        Self {
            service,
            collection,
            vector_size,
        }
    }

    /// Name of the bound collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn probe(&self) -> Result<bool, QdrantError> {
        let collections = self.service.list_collections().await?;
        Ok(collections.iter().any(|name| name == &self.collection))
    }

    async fn ensure_ready(&self) -> Result<(), QdrantError> {
        self.service
            .create_collection_if_not_exists(&self.collection, self.vector_size)
            .await
    }

    async fn upsert(&self, points: Vec<PointInsert>) -> Result<usize, QdrantError> {
        self.service.upsert_points(&self.collection, points).await
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>, QdrantError> {
        self.service
            .search_points(&self.collection, vector, k, score_threshold)
            .await
    }
}
