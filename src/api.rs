//! HTTP surface for Ragserve.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /api/chat` – Answer a question with retrieval-augmented generation.
//!   Accepts an optional `user_name` used for greeting-level personalization only.
//! - `POST /api/refresh-data` – Re-ingest the blob container and swap the live
//!   retrieval pair. Returns ingestion counters (`documents_processed`,
//!   `chunks_created`, `documents_skipped`, `items_indexed`).
//! - `GET /health` – Pipeline readiness flags.
//! - `GET /metrics` – Ingestion and answer counters.
//! - `GET /` – Liveness banner.
//!
//! Failures map to structured `{"error": ...}` bodies: `503` when the
//! pipeline is uninitialized or its backing store is unreachable, `409` when
//! a rebuild is already in flight, `500` otherwise.

use crate::metrics::MetricsSnapshot;
use crate::pipeline::{PipelineCoordinator, PipelineError, PipelineHealth, RebuildReport};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Answer a question, optionally on behalf of a named user.
    async fn answer(
        &self,
        question: &str,
        user_name: Option<&str>,
    ) -> Result<String, PipelineError>;

    /// Re-ingest the container and swap the live retrieval pair.
    async fn rebuild(&self) -> Result<RebuildReport, PipelineError>;

    /// Current readiness view.
    async fn health(&self) -> PipelineHealth;

    /// Current pipeline counters.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

#[async_trait]
impl PipelineApi for PipelineCoordinator {
    async fn answer(
        &self,
        question: &str,
        user_name: Option<&str>,
    ) -> Result<String, PipelineError> {
        PipelineCoordinator::answer(self, question, user_name).await
    }

    async fn rebuild(&self) -> Result<RebuildReport, PipelineError> {
        PipelineCoordinator::rebuild(self).await
    }

    async fn health(&self) -> PipelineHealth {
        PipelineCoordinator::health(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineCoordinator::metrics_snapshot(self)
    }
}

/// Build the HTTP router exposing the serving boundary.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health_check::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/api/chat", post(chat::<S>))
        .route("/api/refresh-data", post(refresh_data::<S>))
        .with_state(service)
}

/// Request body for the `POST /api/chat` endpoint.
#[derive(Deserialize)]
struct ChatRequest {
    /// Natural-language question to answer.
    question: String,
    /// Optional display name supplied by the authentication gate.
    #[serde(default)]
    user_name: Option<String>,
}

/// Success response for the `POST /api/chat` endpoint.
#[derive(Serialize)]
struct ChatResponse {
    /// Generated answer text.
    answer: String,
    /// Whether a user identity was applied to the response.
    personalized: bool,
}

/// Answer a question with the live retrieval pair.
async fn chat<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: PipelineApi,
{
    let ChatRequest {
        question,
        user_name,
    } = request;
    tracing::info!(question = %question, "Chat request received");

    let mut answer = service.answer(&question, user_name.as_deref()).await?;

    // Greeting prefix is presentation only; the pipeline returned raw text.
    if let Some(name) = user_name.as_deref().filter(|name| !name.trim().is_empty())
        && !answer.starts_with("Hello")
    {
        answer = format!("Hello {}! {answer}", name.trim());
    }

    Ok(Json(ChatResponse {
        personalized: user_name.is_some(),
        answer,
    }))
}

/// Success response for the `POST /api/refresh-data` endpoint.
#[derive(Serialize)]
struct RefreshResponse {
    message: &'static str,
    documents_processed: usize,
    chunks_created: usize,
    documents_skipped: usize,
    items_indexed: usize,
}

/// Re-ingest the container and swap the live pair.
async fn refresh_data<S>(State(service): State<Arc<S>>) -> Result<Json<RefreshResponse>, AppError>
where
    S: PipelineApi,
{
    let report = service.rebuild().await?;
    tracing::info!(
        documents = report.documents_processed,
        chunks = report.chunks_created,
        skipped = report.documents_skipped,
        "Refresh request completed"
    );
    Ok(Json(RefreshResponse {
        message: "Data refresh completed successfully",
        documents_processed: report.documents_processed,
        chunks_created: report.chunks_created,
        documents_skipped: report.documents_skipped,
        items_indexed: report.items_indexed,
    }))
}

/// Pipeline readiness flags.
async fn health_check<S>(State(service): State<Arc<S>>) -> Json<PipelineHealth>
where
    S: PipelineApi,
{
    Json(service.health().await)
}

/// Return the current pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Liveness banner.
async fn read_root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::NotInitialized | PipelineError::SourceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PipelineError::RebuildInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    struct StubPipeline {
        answer: Result<String, fn() -> PipelineError>,
        rebuild: Result<RebuildReport, fn() -> PipelineError>,
        questions: Mutex<Vec<(String, Option<String>)>>,
    }

    impl StubPipeline {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                rebuild: Ok(RebuildReport::default()),
                questions: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: fn() -> PipelineError) -> Self {
            Self {
                answer: Err(error),
                rebuild: Err(error),
                questions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn answer(
            &self,
            question: &str,
            user_name: Option<&str>,
        ) -> Result<String, PipelineError> {
            self.questions
                .lock()
                .await
                .push((question.to_string(), user_name.map(str::to_string)));
            self.answer.as_ref().map(Clone::clone).map_err(|make| make())
        }

        async fn rebuild(&self) -> Result<RebuildReport, PipelineError> {
            self.rebuild.as_ref().map(|report| *report).map_err(|make| make())
        }

        async fn health(&self) -> PipelineHealth {
            PipelineHealth {
                state: "ready".into(),
                pipeline_initialized: true,
                error: None,
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            crate::metrics::PipelineMetrics::new().snapshot()
        }
    }

    async fn post_json(
        app: Router,
        uri: &str,
        payload: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn chat_returns_answer_with_greeting_for_named_user() {
        let service = Arc::new(StubPipeline::answering("Paris is the capital of France."));
        let app = create_router(service.clone());

        let (status, body) = post_json(
            app,
            "/api/chat",
            json!({ "question": "What is the capital of France?", "user_name": "Ada" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Hello Ada! Paris is the capital of France.");
        assert_eq!(body["personalized"], true);

        let questions = service.questions.lock().await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].1.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn chat_leaves_answer_untouched_for_anonymous_user() {
        let service = Arc::new(StubPipeline::answering("Paris."));
        let app = create_router(service);

        let (status, body) = post_json(app, "/api/chat", json!({ "question": "Capital?" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Paris.");
        assert_eq!(body["personalized"], false);
    }

    #[tokio::test]
    async fn uninitialized_pipeline_maps_to_service_unavailable() {
        let service = Arc::new(StubPipeline::failing(|| PipelineError::NotInitialized));
        let app = create_router(service);

        let (status, body) = post_json(app, "/api/chat", json!({ "question": "Q" })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().expect("error").contains("not initialized"));
    }

    #[tokio::test]
    async fn concurrent_rebuild_maps_to_conflict() {
        let service = Arc::new(StubPipeline::failing(|| PipelineError::RebuildInProgress));
        let app = create_router(service);

        let (status, body) = post_json(app, "/api/refresh-data", json!({})).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().expect("error").contains("in progress"));
    }

    #[tokio::test]
    async fn refresh_reports_ingestion_counts() {
        let service = Arc::new(StubPipeline {
            answer: Ok(String::new()),
            rebuild: Ok(RebuildReport {
                documents_processed: 4,
                documents_skipped: 1,
                chunks_created: 9,
                items_indexed: 9,
            }),
            questions: Mutex::new(Vec::new()),
        });
        let app = create_router(service);

        let (status, body) = post_json(app, "/api/refresh-data", json!({})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documents_processed"], 4);
        assert_eq!(body["documents_skipped"], 1);
        assert_eq!(body["chunks_created"], 9);
        assert_eq!(body["items_indexed"], 9);
    }

    #[tokio::test]
    async fn health_reports_pipeline_state() {
        let service = Arc::new(StubPipeline::answering(""));
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["state"], "ready");
        assert_eq!(json["pipeline_initialized"], true);
    }
}
