//! HTTP client wrapper for the blob container REST surface.

use crate::blobstore::types::{BlobStoreError, SourceObject};
use crate::config::get_config;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, Method};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lightweight HTTP client for container listing and blob downloads.
pub struct BlobContainerClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) container: String,
    pub(crate) sas_token: Option<String>,
}

impl BlobContainerClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, BlobStoreError> {
        let config = get_config();
        let client = Client::builder()
            .user_agent("ragserve/0.3")
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base_url =
            normalize_base_url(&config.blob_account_url).map_err(BlobStoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            container = %config.blob_container,
            has_sas_token = config.blob_sas_token.is_some(),
            "Initialized blob container client"
        );

        Ok(Self {
            client,
            base_url,
            container: config.blob_container.clone(),
            sas_token: config.blob_sas_token.clone(),
        })
    }

    /// Enumerate all blob names in the container, following listing pages.
    pub async fn list_blobs(&self) -> Result<Vec<String>, BlobStoreError> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut query = vec![
                ("restype".to_string(), "container".to_string()),
                ("comp".to_string(), "list".to_string()),
            ];
            if let Some(current) = &marker {
                query.push(("marker".to_string(), current.clone()));
            }

            let response = self
                .request(Method::GET, &self.container)
                .query(&query)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = BlobStoreError::UnexpectedStatus { status, body };
                tracing::error!(container = %self.container, error = %error, "Failed to list blobs");
                return Err(error);
            }

            let body = response.text().await?;
            let page = parse_listing(&body)?;
            names.extend(page.names);

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::debug!(container = %self.container, blobs = names.len(), "Container listed");
        Ok(names)
    }

    /// Download a single blob's bytes by name.
    pub async fn fetch_blob(&self, name: &str) -> Result<SourceObject, BlobStoreError> {
        let path = format!("{}/{}", self.container, name);
        let response = self.request(Method::GET, &path).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = BlobStoreError::UnexpectedStatus { status, body };
            tracing::error!(blob = name, error = %error, "Failed to fetch blob");
            return Err(error);
        }

        let bytes = response.bytes().await?.to_vec();
        Ok(SourceObject {
            name: name.to_string(),
            bytes,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.sas_token
            && !token.is_empty()
        {
            // SAS tokens are pre-signed query strings; split into pairs so
            // reqwest composes them with the listing parameters.
            let pairs: Vec<(&str, &str)> = token
                .trim_start_matches('?')
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .collect();
            req = req.query(&pairs);
        }
        req
    }
}

struct ListingPage {
    names: Vec<String>,
    next_marker: Option<String>,
}

/// Parse the `EnumerationResults` XML returned by a container listing.
fn parse_listing(xml: &str) -> Result<ListingPage, BlobStoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut names = Vec::new();
    let mut next_marker = None;
    let mut in_blob = false;
    let mut capture: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"Blob" => in_blob = true,
                b"Name" if in_blob => capture = Some("name"),
                b"NextMarker" => capture = Some("marker"),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|err| BlobStoreError::MalformedListing(err.to_string()))?;
                match capture {
                    Some("name") => names.push(value.into_owned()),
                    Some("marker") if !value.is_empty() => {
                        next_marker = Some(value.into_owned());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Blob" => in_blob = false,
                    _ => {}
                }
                capture = None;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(BlobStoreError::MalformedListing(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(ListingPage { names, next_marker })
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    fn test_client(server: &MockServer) -> BlobContainerClient {
        BlobContainerClient {
            client: Client::builder()
                .user_agent("ragserve-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            container: "docs".into(),
            sas_token: None,
        }
    }

    #[tokio::test]
    async fn list_blobs_parses_enumeration_results() {
        let server = MockServer::start_async().await;
        let listing = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ContainerName="docs">
  <Blobs>
    <Blob><Name>handbook.pdf</Name></Blob>
    <Blob><Name>orientation.pptx</Name></Blob>
    <Blob><Name>campus-map.png</Name></Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#;

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/docs")
                    .query_param("restype", "container")
                    .query_param("comp", "list");
                then.status(200).body(listing);
            })
            .await;

        let names = test_client(&server).list_blobs().await.expect("listing");

        mock.assert();
        assert_eq!(
            names,
            vec![
                "handbook.pdf".to_string(),
                "orientation.pptx".to_string(),
                "campus-map.png".to_string()
            ]
        );
    }

    #[test]
    fn parse_listing_extracts_continuation_marker() {
        let page = r#"<EnumerationResults>
  <Blobs><Blob><Name>a.txt</Name></Blob></Blobs>
  <NextMarker>page-2</NextMarker>
</EnumerationResults>"#;
        let parsed = parse_listing(page).expect("listing");
        assert_eq!(parsed.names, vec!["a.txt".to_string()]);
        assert_eq!(parsed.next_marker.as_deref(), Some("page-2"));
    }

    #[test]
    fn parse_listing_treats_empty_marker_as_final_page() {
        let page = r#"<EnumerationResults>
  <Blobs><Blob><Name>b.txt</Name></Blob></Blobs>
  <NextMarker />
</EnumerationResults>"#;
        let parsed = parse_listing(page).expect("listing");
        assert_eq!(parsed.names, vec!["b.txt".to_string()]);
        assert!(parsed.next_marker.is_none());
    }

    #[tokio::test]
    async fn fetch_blob_returns_bytes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/docs/notes.txt");
                then.status(200).body("Paris is the capital of France.");
            })
            .await;

        let object = test_client(&server)
            .fetch_blob("notes.txt")
            .await
            .expect("blob");
        assert_eq!(object.name, "notes.txt");
        assert_eq!(object.bytes, b"Paris is the capital of France.".to_vec());
    }

    #[tokio::test]
    async fn auth_failure_surfaces_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/docs");
                then.status(403).body("forbidden");
            })
            .await;

        let error = test_client(&server).list_blobs().await.expect_err("error");
        assert!(matches!(
            error,
            BlobStoreError::UnexpectedStatus { status, .. } if status.as_u16() == 403
        ));
    }
}
