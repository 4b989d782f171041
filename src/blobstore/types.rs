//! Shared types used by the blob container client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while interacting with the blob container.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// Account URL failed to parse or normalize.
    #[error("Invalid blob account URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Container responded with an unexpected status code.
    #[error("Unexpected blob store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the container endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Listing response body could not be parsed.
    #[error("Malformed container listing: {0}")]
    MalformedListing(String),
}

/// A named blob together with its raw bytes.
#[derive(Debug, Clone)]
pub struct SourceObject {
    /// Blob name within the container, including any suffix.
    pub name: String,
    /// Raw object bytes as downloaded.
    pub bytes: Vec<u8>,
}
