//! Full lifecycle: session writes become entries, workers drain them
//! into the backend, success removes them.

use chrono::Utc;
use e2e_tests::{Post, TestQueue};
use indexq_engine::{ProcessOptions, ProcessOutcome};
use indexq_session::with_priority;
use indexq_store::EntryStore;
use indexq_types::{Operation, RecordId};
use serde_json::json;

#[tokio::test]
async fn test_save_reaches_index_through_worker() {
    let queue = TestQueue::new();
    let post = Post::new(1, "hello");

    queue.save(&post).await;
    assert_eq!(queue.store.pending_count().await.unwrap(), 1);
    assert!(!queue.backend.contains(&post.doc_ref()));

    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    match outcome {
        ProcessOutcome::Completed(report) => {
            assert_eq!(report.succeeded, 1);
        }
        other => panic!("expected Completed, got {:?}", other),
    }

    assert_eq!(queue.store.pending_count().await.unwrap(), 0);
    assert_eq!(
        queue.backend.document(&post.doc_ref()),
        Some(json!({"title": "hello"}))
    );
}

#[tokio::test]
async fn test_batch_uses_one_bulk_call_per_operation() {
    let queue = TestQueue::new();
    for n in 1..=3 {
        queue.save(&Post::new(n, "bulk")).await;
    }
    let doomed = Post::new(4, "doomed");
    queue.save(&doomed).await;
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    queue.proxy.destroy(&doomed).await.unwrap();

    *queue.backend.index_calls.lock().unwrap() = 0;
    *queue.backend.delete_calls.lock().unwrap() = 0;
    for n in 1..=3 {
        queue.save(&Post::new(n, "bulk again")).await;
    }
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    // Three updates and one delete cost exactly two round trips
    assert_eq!(*queue.backend.index_calls.lock().unwrap(), 1);
    assert_eq!(*queue.backend.delete_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_mutation_sequence_coalesces_to_latest_operation() {
    let queue = TestQueue::new();
    let post = Post::new(1, "hello");

    queue.save(&post).await;
    queue.save(&post).await;
    queue.proxy.destroy(&post).await.unwrap();
    let last = queue.save(&post).await;

    // One entry, reflecting the latest mutation
    let due = queue.store.find_due(10, None).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, last.id);
    assert_eq!(due[0].operation, Operation::Index);
}

#[tokio::test]
async fn test_destroy_removes_document_from_index() {
    let queue = TestQueue::new();
    let post = Post::new(1, "hello");

    queue.save(&post).await;
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    assert!(queue.backend.contains(&post.doc_ref()));

    queue.proxy.destroy(&post).await.unwrap();
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    assert!(!queue.backend.contains(&post.doc_ref()));
    assert_eq!(queue.store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_priority_claim_order_then_rejection_backoff() {
    // A at default priority, B at priority 1: B claims first, then B is
    // rejected with "invalid field" and backs off while A succeeds and
    // is deleted.
    let queue = TestQueue::new();
    let record_a = Post::new(1, "a");
    let record_b = Post::new(2, "b");

    queue.save(&record_a).await;
    let doc_b = record_b.to_document();
    queue.source.insert(doc_b.id.clone(), doc_b.fields);
    with_priority(1, queue.proxy.save(&record_b)).await.unwrap();

    let due = queue.store.find_due(10, None).await.unwrap();
    assert_eq!(due.len(), 2);
    assert_eq!(due[0].record_id, RecordId::Int(2), "B claims first");
    assert_eq!(due[1].record_id, RecordId::Int(1));

    queue.backend.reject(record_b.doc_ref());
    let before = Utc::now();
    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    match outcome {
        ProcessOutcome::Completed(report) => {
            assert_eq!(report.succeeded, 1);
            assert_eq!(report.rescheduled, 1);
        }
        other => panic!("expected Completed, got {:?}", other),
    }

    // A applied and dequeued
    assert!(queue.backend.contains(&record_a.doc_ref()));
    let remaining = queue.store.pending_count().await.unwrap();
    assert_eq!(remaining, 1);

    // B backed off with its failure on record
    let entry_b = queue
        .store
        .get(&due[0].id)
        .await
        .expect("B stays queued");
    assert_eq!(entry_b.attempt_count, 1);
    assert_eq!(entry_b.last_error.as_ref().unwrap().message, "invalid field");
    assert!(entry_b.run_at >= before + chrono::Duration::seconds(60));
}

#[tokio::test]
async fn test_missing_record_cleans_stale_document() {
    let queue = TestQueue::new();
    let post = Post::new(1, "hello");

    // Document already in the index from an earlier save
    queue.save(&post).await;
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    // Record mutates, then vanishes before the worker claims it
    queue.save(&post).await;
    queue.source.remove(&post.doc_ref());

    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    match outcome {
        ProcessOutcome::Completed(report) => assert_eq!(report.succeeded, 1),
        other => panic!("expected Completed, got {:?}", other),
    }

    assert!(!queue.backend.contains(&post.doc_ref()));
    assert_eq!(queue.store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_query_passes_through_while_queue_is_pending() {
    let queue = TestQueue::new();
    let post = Post::new(1, "hello");
    queue.save(&post).await;

    // The read sees the index as it is, not the queued state
    let response = queue.proxy.query(json!({"q": "hello"})).await.unwrap();
    assert_eq!(response, json!({"total": 0}));

    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    let response = queue.proxy.query(json!({"q": "hello"})).await.unwrap();
    assert_eq!(response, json!({"total": 1}));
}
