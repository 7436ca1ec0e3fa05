//! Batch dispatcher.
//!
//! Groups a claimed batch by operation and submits it to the search
//! client as at most two bulk calls: one add/update, one delete. The
//! report distinguishes the two failure classes the client can raise:
//! per-document rejections (recorded against their entries) and a
//! whole-call outage (every not-yet-applied entry is deferred with no
//! penalty).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use indexq_client::SearchClient;
use indexq_types::{Document, DocumentRef, EntryFailure};

/// Outcome of dispatching one claimed batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Entry ids confirmed applied at the backend
    pub succeeded: Vec<String>,

    /// Entry ids the backend rejected, with failure detail
    pub rejected: Vec<(String, EntryFailure)>,

    /// Entry ids left untouched because the backend was unreachable
    pub deferred: Vec<String>,

    /// Set when either bulk call hit an outage
    pub outage: Option<String>,
}

/// Dispatches claimed entries to the search backend in bulk.
pub struct BatchDispatcher<C> {
    client: Arc<C>,
}

impl<C: SearchClient> BatchDispatcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Dispatch index documents and delete refs, minimizing round trips.
    ///
    /// Index entries go first. An outage on the index call defers the
    /// entire batch; an outage on the delete call defers only the delete
    /// group, since the index results already stand.
    pub async fn dispatch(
        &self,
        index_group: Vec<(String, Document)>,
        delete_group: Vec<(String, DocumentRef)>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        if !index_group.is_empty() {
            let by_ref: HashMap<DocumentRef, String> = index_group
                .iter()
                .map(|(id, doc)| (doc.id.clone(), id.clone()))
                .collect();
            let documents: Vec<Document> =
                index_group.into_iter().map(|(_, doc)| doc).collect();

            debug!(count = documents.len(), "Submitting bulk index");
            match self.client.bulk_index(documents).await {
                Ok(rejections) => {
                    apply_call_results(&mut report, by_ref, rejections);
                }
                Err(outage) => {
                    // No partial information exists; defer everything
                    report.deferred.extend(by_ref.into_values());
                    report
                        .deferred
                        .extend(delete_group.into_iter().map(|(id, _)| id));
                    report.outage = Some(outage.message);
                    return report;
                }
            }
        }

        if !delete_group.is_empty() {
            let by_ref: HashMap<DocumentRef, String> = delete_group
                .iter()
                .map(|(id, doc_ref)| (doc_ref.clone(), id.clone()))
                .collect();
            let refs: Vec<DocumentRef> =
                delete_group.into_iter().map(|(_, doc_ref)| doc_ref).collect();

            debug!(count = refs.len(), "Submitting bulk delete");
            match self.client.bulk_delete(refs).await {
                Ok(rejections) => {
                    apply_call_results(&mut report, by_ref, rejections);
                }
                Err(outage) => {
                    report.deferred.extend(by_ref.into_values());
                    report.outage = Some(outage.message);
                }
            }
        }

        report
    }
}

/// Fold one bulk call's result into the report: rejected refs map back
/// to their entries, everything else in the call succeeded.
fn apply_call_results(
    report: &mut DispatchReport,
    mut by_ref: HashMap<DocumentRef, String>,
    rejections: Vec<indexq_client::Rejection>,
) {
    for rejection in rejections {
        match by_ref.remove(&rejection.doc) {
            Some(entry_id) => {
                let mut failure = EntryFailure::new(rejection.message);
                if let Some(trace) = rejection.trace {
                    failure = failure.with_trace(trace);
                }
                report.rejected.push((entry_id, failure));
            }
            None => {
                warn!(doc = %rejection.doc, "Rejection for document not in this batch");
            }
        }
    }
    report.succeeded.extend(by_ref.into_values());
}
