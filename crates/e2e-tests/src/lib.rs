//! End-to-end test infrastructure for indexq.
//!
//! Provides a shared TestQueue harness plus fake collaborators: an
//! idempotent in-memory search backend and a map-backed document
//! source, both scriptable for outage and rejection scenarios.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use indexq_client::{Rejection, SearchClient, SearchUnreachable};
use indexq_engine::{DocumentSource, QueueEngine, RetryPolicy, SourceError};
use indexq_session::{Indexable, SessionProxy};
use indexq_store::MemoryStore;
use indexq_types::{Document, DocumentRef, RecordId};

/// Scriptable idempotent search backend.
///
/// Applies bulk calls to a document map keyed by identity, so
/// redelivering an operation is a last-write-wins no-op — the same
/// contract the engine relies on in production.
#[derive(Default)]
pub struct FakeBackend {
    down: Mutex<bool>,
    delete_down: Mutex<bool>,
    reject: Mutex<HashSet<DocumentRef>>,
    documents: Mutex<HashMap<DocumentRef, serde_json::Value>>,
    pub index_calls: Mutex<usize>,
    pub delete_calls: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the whole service unreachable.
    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    /// Mark only the delete endpoint unreachable.
    pub fn set_delete_down(&self, down: bool) {
        *self.delete_down.lock().unwrap() = down;
    }

    /// Reject this document on future bulk calls.
    pub fn reject(&self, doc_ref: DocumentRef) {
        self.reject.lock().unwrap().insert(doc_ref);
    }

    /// Stop rejecting this document.
    pub fn accept(&self, doc_ref: &DocumentRef) {
        self.reject.lock().unwrap().remove(doc_ref);
    }

    pub fn contains(&self, doc_ref: &DocumentRef) -> bool {
        self.documents.lock().unwrap().contains_key(doc_ref)
    }

    pub fn document(&self, doc_ref: &DocumentRef) -> Option<serde_json::Value> {
        self.documents.lock().unwrap().get(doc_ref).cloned()
    }

    /// Snapshot of the full index state, for idempotence comparisons.
    pub fn snapshot(&self) -> HashMap<DocumentRef, serde_json::Value> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for FakeBackend {
    async fn bulk_index(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Rejection>, SearchUnreachable> {
        *self.index_calls.lock().unwrap() += 1;
        if *self.down.lock().unwrap() {
            return Err(SearchUnreachable::new("service down"));
        }

        let reject = self.reject.lock().unwrap().clone();
        let mut rejections = Vec::new();
        for doc in documents {
            if reject.contains(&doc.id) {
                rejections.push(Rejection::new(doc.id, "invalid field"));
            } else {
                self.documents.lock().unwrap().insert(doc.id, doc.fields);
            }
        }
        Ok(rejections)
    }

    async fn bulk_delete(
        &self,
        refs: Vec<DocumentRef>,
    ) -> Result<Vec<Rejection>, SearchUnreachable> {
        *self.delete_calls.lock().unwrap() += 1;
        if *self.down.lock().unwrap() || *self.delete_down.lock().unwrap() {
            return Err(SearchUnreachable::new("service down"));
        }

        for doc_ref in refs {
            self.documents.lock().unwrap().remove(&doc_ref);
        }
        Ok(Vec::new())
    }

    async fn query(
        &self,
        _request: serde_json::Value,
    ) -> Result<serde_json::Value, SearchUnreachable> {
        if *self.down.lock().unwrap() {
            return Err(SearchUnreachable::new("service down"));
        }
        let count = self.documents.lock().unwrap().len();
        Ok(json!({ "total": count }))
    }
}

/// Map-backed document source.
#[derive(Default)]
pub struct FakeSource {
    records: Mutex<HashMap<DocumentRef, serde_json::Value>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc_ref: DocumentRef, fields: serde_json::Value) {
        self.records.lock().unwrap().insert(doc_ref, fields);
    }

    pub fn remove(&self, doc_ref: &DocumentRef) {
        self.records.lock().unwrap().remove(doc_ref);
    }
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn load(
        &self,
        refs: &[DocumentRef],
    ) -> Result<Vec<(DocumentRef, Option<Document>)>, SourceError> {
        let records = self.records.lock().unwrap();
        Ok(refs
            .iter()
            .map(|r| {
                let doc = records
                    .get(r)
                    .map(|fields| Document::new(r.clone(), fields.clone()));
                (r.clone(), doc)
            })
            .collect())
    }
}

/// A minimal indexed model for tests.
pub struct Post {
    pub id: i64,
    pub title: String,
}

impl Post {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
        }
    }

    pub fn doc_ref(&self) -> DocumentRef {
        DocumentRef::new("Post", self.id)
    }
}

impl Indexable for Post {
    fn record_type(&self) -> &str {
        "Post"
    }

    fn record_id(&self) -> RecordId {
        RecordId::Int(self.id)
    }

    fn to_document(&self) -> Document {
        Document::new(self.doc_ref(), json!({ "title": self.title }))
    }
}

/// Fully wired queue over in-memory collaborators.
pub struct TestQueue {
    pub store: Arc<MemoryStore>,
    pub backend: Arc<FakeBackend>,
    pub source: Arc<FakeSource>,
    pub engine: QueueEngine<MemoryStore, FakeBackend, FakeSource>,
    pub proxy: SessionProxy<MemoryStore, FakeBackend>,
}

impl TestQueue {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::default())
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(FakeBackend::new());
        let source = Arc::new(FakeSource::new());

        let engine = QueueEngine::new(store.clone(), backend.clone(), source.clone(), retry);
        let proxy = SessionProxy::new(store.clone(), backend.clone());

        Self {
            store,
            backend,
            source,
            engine,
            proxy,
        }
    }

    /// Register a record with the source and queue its save.
    pub async fn save(&self, post: &Post) -> indexq_types::QueueEntry {
        let doc = post.to_document();
        self.source.insert(doc.id.clone(), doc.fields);
        self.proxy.save(post).await.expect("save should enqueue")
    }
}

impl Default for TestQueue {
    fn default() -> Self {
        Self::new()
    }
}
