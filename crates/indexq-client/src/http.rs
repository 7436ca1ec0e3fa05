//! JSON-over-HTTP search client.
//!
//! Reference implementation of [`SearchClient`] against a backend
//! exposing three endpoints under one base URL:
//!
//! - `POST {base}/bulk/index`  body `{"documents": [...]}`
//! - `POST {base}/bulk/delete` body `{"refs": [...]}`
//! - `POST {base}/search`      body passed through verbatim
//!
//! A 2xx bulk response carries `{"rejections": [...]}` listing only the
//! refused subset. Transport failures and non-2xx statuses map to
//! `SearchUnreachable`: if the service cannot answer a bulk call as a
//! whole, no per-document information exists.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use indexq_types::{Document, DocumentRef};

use crate::client::{Rejection, SearchClient, SearchUnreachable};

/// Configuration for the HTTP search client.
#[derive(Debug, Clone)]
pub struct HttpSearchConfig {
    /// Base URL of the search backend (e.g. "http://127.0.0.1:8080")
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,
}

impl HttpSearchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP search client.
pub struct HttpSearchClient {
    client: Client,
    config: HttpSearchConfig,
}

impl HttpSearchClient {
    /// Create a new client.
    pub fn new(config: HttpSearchConfig) -> Result<Self, SearchUnreachable> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchUnreachable::new(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Post a bulk payload and decode the rejected subset.
    async fn post_bulk<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Vec<Rejection>, SearchUnreachable> {
        #[derive(Deserialize)]
        struct BulkResponse {
            #[serde(default)]
            rejections: Vec<Rejection>,
        }

        let url = format!("{}/{}", self.config.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchUnreachable::new(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchUnreachable::new(format!(
                "{} returned {}",
                url, status
            )));
        }

        let decoded: BulkResponse = response
            .json()
            .await
            .map_err(|e| SearchUnreachable::new(format!("invalid bulk response: {}", e)))?;

        debug!(
            endpoint = endpoint,
            rejections = decoded.rejections.len(),
            "Bulk call completed"
        );
        Ok(decoded.rejections)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn bulk_index(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Rejection>, SearchUnreachable> {
        #[derive(Serialize)]
        struct IndexRequest {
            documents: Vec<Document>,
        }

        self.post_bulk("bulk/index", &IndexRequest { documents })
            .await
    }

    async fn bulk_delete(
        &self,
        refs: Vec<DocumentRef>,
    ) -> Result<Vec<Rejection>, SearchUnreachable> {
        #[derive(Serialize)]
        struct DeleteRequest {
            refs: Vec<DocumentRef>,
        }

        self.post_bulk("bulk/delete", &DeleteRequest { refs }).await
    }

    async fn query(
        &self,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, SearchUnreachable> {
        let url = format!("{}/search", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchUnreachable::new(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchUnreachable::new(format!(
                "{} returned {}",
                url, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SearchUnreachable::new(format!("invalid query response: {}", e)))
    }
}
