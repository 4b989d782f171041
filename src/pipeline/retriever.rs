//! Similarity retrieval over the vector collection.

use crate::embedding::Embedder;
use crate::pipeline::store::VectorIndex;
use crate::pipeline::types::{PipelineError, ScoredChunk};
use crate::qdrant::ScoredPoint;
use serde_json::Value;
use std::sync::Arc;

/// Retrieves the most similar stored chunks for a question.
///
/// Queries are embedded with the same model used at index time; mixing
/// models across a rebuild boundary silently degrades ranking, so the
/// coordinator always constructs the retriever and the index builder from
/// the same embedder handle.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    embedding_dimension: usize,
    top_k: usize,
    score_threshold: Option<f32>,
}

impl Retriever {
    /// Bind the query path to a collection and retrieval parameters.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        embedding_dimension: usize,
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_dimension,
            top_k,
            score_threshold,
        }
    }

    /// Return the top-`k` most similar chunks for the query, filtered by the
    /// configured score threshold when one is set.
    ///
    /// If the store rejects the threshold-filtered query, the retriever
    /// falls back to a plain top-`k` search and keeps serving rather than
    /// failing the pipeline.
    pub async fn search(&self, query: &str) -> Result<Vec<ScoredChunk>, PipelineError> {
        let vector = self.embedder.embed_query(query).await?;

        let actual = vector.len();
        if actual != self.embedding_dimension {
            return Err(PipelineError::DimensionMismatch {
                expected: self.embedding_dimension,
                actual,
            });
        }

        let points = match self
            .index
            .search(vector.clone(), self.top_k, self.score_threshold)
            .await
        {
            Ok(points) => points,
            Err(error) if self.score_threshold.is_some() && error.is_rejected_request() => {
                tracing::warn!(
                    error = %error,
                    "Threshold-filtered search rejected; falling back to plain top-k"
                );
                self.index.search(vector, self.top_k, None).await?
            }
            Err(error) => return Err(error.into()),
        };

        Ok(points.into_iter().map(map_scored_point).collect())
    }
}

/// Map a stored point into the context item handed to the composer.
fn map_scored_point(point: ScoredPoint) -> ScoredChunk {
    let ScoredPoint { score, payload, .. } = point;

    let mut text = String::new();
    let mut source = None;
    let mut page = None;

    if let Some(mut map) = payload {
        if let Some(Value::String(value)) = map.remove("text") {
            text = value;
        }
        if let Some(Value::String(value)) = map.remove("source") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                source = Some(trimmed.to_string());
            }
        }
        if let Some(value) = map.remove("page") {
            page = value.as_u64().map(|page| page as usize);
        }
    }

    ScoredChunk {
        text,
        score,
        source,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn map_scored_point_extracts_payload_fields() {
        let mut payload = Map::new();
        payload.insert(
            "text".into(),
            Value::String("Paris is the capital of France.".into()),
        );
        payload.insert("source".into(), Value::String("handbook.pdf".into()));
        payload.insert("page".into(), Value::from(3));

        let point = ScoredPoint {
            id: "chunk-1".into(),
            score: 0.92,
            payload: Some(payload),
        };

        let chunk = map_scored_point(point);
        assert_eq!(chunk.text, "Paris is the capital of France.");
        assert_eq!(chunk.source.as_deref(), Some("handbook.pdf"));
        assert_eq!(chunk.page, Some(3));
        assert!((chunk.score - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn map_scored_point_tolerates_missing_payload() {
        let point = ScoredPoint {
            id: "chunk-2".into(),
            score: 0.1,
            payload: None,
        };
        let chunk = map_scored_point(point);
        assert!(chunk.text.is_empty());
        assert!(chunk.source.is_none());
        assert!(chunk.page.is_none());
    }
}
