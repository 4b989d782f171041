#![deny(missing_docs)]

//! Core library for the Ragserve question answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Blob container client used to enumerate and fetch source documents.
pub mod blobstore;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text-generation client abstraction and adapters.
pub mod generation;
/// Document loading and multi-format text extraction.
pub mod loader;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and answer metrics helpers.
pub mod metrics;
/// Ingestion and retrieval pipeline, including the live coordinator.
pub mod pipeline;
/// Qdrant vector store integration.
pub mod qdrant;
