//! Blob container integration for source documents.

pub mod client;
pub mod types;

pub use client::BlobContainerClient;
pub use types::{BlobStoreError, SourceObject};
