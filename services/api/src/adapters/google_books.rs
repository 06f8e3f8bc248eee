//! services/api/src/adapters/google_books.rs
//!
//! This module contains the adapter for the Google Books volumes API.
//! It implements the `CatalogProvider` port from the `core` crate.

use async_trait::async_trait;
use booktracker_core::catalog::{Volume, VolumeList};
use booktracker_core::ports::{CatalogProvider, PortError, PortResult};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogProvider` port over HTTP.
#[derive(Clone, Debug)]
pub struct GoogleBooksAdapter {
    client: reqwest::Client,
    volumes_url: Url,
    api_key: String,
}

impl GoogleBooksAdapter {
    /// Creates a new `GoogleBooksAdapter`. An empty `api_key` is not sent.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> PortResult<Self> {
        let volumes_url = Url::parse(&format!("{}/volumes", base_url.trim_end_matches('/')))
            .map_err(|e| PortError::Unexpected(format!("invalid catalog url: {}", e)))?;
        if volumes_url.cannot_be_a_base() {
            return Err(PortError::Unexpected(format!(
                "invalid catalog url: {}",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            volumes_url,
            api_key: api_key.to_string(),
        })
    }

    /// The URL of one volume; the id is percent-encoded as a single path segment.
    fn volume_url(&self, external_id: &str) -> PortResult<Url> {
        let mut url = self.volumes_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("catalog url cannot carry a path".to_string()))?
            .push(external_id);
        Ok(url)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.query(&[("key", self.api_key.as_str())])
        }
    }
}

fn transport_error(e: reqwest::Error) -> PortError {
    PortError::Unavailable(format!("catalog request failed: {}", e))
}

//=========================================================================================
// `CatalogProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogProvider for GoogleBooksAdapter {
    async fn search_volumes(&self, query: &str, max_results: u32) -> PortResult<Vec<Volume>> {
        let max_results = max_results.to_string();
        let request = self
            .client
            .get(self.volumes_url.clone())
            .query(&[("q", query), ("maxResults", max_results.as_str())]);

        let response = self.with_key(request).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Unavailable(format!(
                "catalog search returned {}",
                status
            )));
        }

        let list: VolumeList = response.json().await.map_err(|e| {
            PortError::Unexpected(format!("malformed catalog response: {}", e))
        })?;
        debug!("Catalog returned {} volumes for '{}'", list.items.len(), query);
        Ok(list.items)
    }

    async fn get_volume(&self, external_id: &str) -> PortResult<Volume> {
        let url = self.volume_url(external_id)?;
        let response = self
            .with_key(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => response.json::<Volume>().await.map_err(|e| {
                PortError::Unexpected(format!("malformed catalog volume: {}", e))
            }),
            StatusCode::NOT_FOUND => Err(PortError::NotFound(format!(
                "Catalog volume {} not found",
                external_id
            ))),
            status => Err(PortError::Unavailable(format!(
                "catalog lookup returned {}",
                status
            ))),
        }
    }
}
