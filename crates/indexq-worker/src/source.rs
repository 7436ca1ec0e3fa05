//! HTTP document source.
//!
//! Fetches index documents from the application's document endpoint:
//! `GET {base}/document?type={record_type}&id={record_id}`. A 200
//! response body is the document's field payload, a 404 means the
//! record no longer exists; anything else fails the iteration.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use indexq_engine::{DocumentSource, SourceError};
use indexq_types::{Document, DocumentRef};

/// Document source backed by an application HTTP endpoint.
pub struct HttpDocumentSource {
    client: Client,
    base_url: String,
}

impl HttpDocumentSource {
    /// Create a new source.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::new(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch(&self, doc_ref: &DocumentRef) -> Result<Option<Document>, SourceError> {
        let url = format!("{}/document", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", doc_ref.record_type.as_str()),
                ("id", &doc_ref.record_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(record = %doc_ref, "Record not found at source");
                Ok(None)
            }
            status if status.is_success() => {
                let fields: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| SourceError::new(format!("invalid document body: {}", e)))?;
                Ok(Some(Document::new(doc_ref.clone(), fields)))
            }
            status => Err(SourceError::new(format!(
                "{} returned {} for {}",
                url, status, doc_ref
            ))),
        }
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn load(
        &self,
        refs: &[DocumentRef],
    ) -> Result<Vec<(DocumentRef, Option<Document>)>, SourceError> {
        let mut loaded = Vec::with_capacity(refs.len());
        for doc_ref in refs {
            let doc = self.fetch(doc_ref).await?;
            loaded.push((doc_ref.clone(), doc));
        }
        Ok(loaded)
    }
}
