//! Outage behavior: a wholesale backend failure defers the batch with
//! no retry penalty, unlike per-document rejections.

use chrono::Utc;
use e2e_tests::{Post, TestQueue};
use indexq_engine::{ProcessOptions, ProcessOutcome};
use indexq_store::EntryStore;

#[tokio::test]
async fn test_outage_defers_batch_without_penalty() {
    let queue = TestQueue::new();

    let mut ids = Vec::new();
    for n in 1..=5 {
        let entry = queue.save(&Post::new(n, "post")).await;
        ids.push(entry.id);
    }

    queue.backend.set_down(true);
    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    match outcome {
        ProcessOutcome::Outage { report, reason } => {
            assert_eq!(report.claimed, 5);
            assert_eq!(report.deferred, 5);
            assert_eq!(report.succeeded, 0);
            assert_eq!(report.rescheduled, 0);
            assert_eq!(reason, "service down");
        }
        other => panic!("expected Outage, got {:?}", other),
    }

    // All five remain, attempt counts unchanged, immediately eligible
    assert_eq!(queue.store.pending_count().await.unwrap(), 5);
    let now = Utc::now();
    for id in &ids {
        let entry = queue.store.get(id).await.unwrap();
        assert_eq!(entry.attempt_count, 0);
        assert!(entry.last_error.is_none());
        assert!(entry.is_due(now));
    }
}

#[tokio::test]
async fn test_recovery_after_outage_drains_everything() {
    let queue = TestQueue::new();
    for n in 1..=3 {
        queue.save(&Post::new(n, "post")).await;
    }

    queue.backend.set_down(true);
    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, ProcessOutcome::Outage { .. }));

    queue.backend.set_down(false);
    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    match outcome {
        ProcessOutcome::Completed(report) => assert_eq!(report.succeeded, 3),
        other => panic!("expected Completed, got {:?}", other),
    }
    assert_eq!(queue.store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_outage_keeps_index_group_results() {
    let queue = TestQueue::new();

    // One index entry and one delete entry in the same batch
    let indexed = Post::new(1, "kept");
    queue.save(&indexed).await;

    let doomed = Post::new(2, "doomed");
    queue.save(&doomed).await;
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    queue.proxy.destroy(&doomed).await.unwrap();
    queue.save(&indexed).await;

    queue.backend.set_delete_down(true);
    let outcome = queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    match outcome {
        ProcessOutcome::Outage { report, .. } => {
            // Index call already stood when the delete call failed
            assert_eq!(report.succeeded, 1);
            assert_eq!(report.deferred, 1);
        }
        other => panic!("expected Outage, got {:?}", other),
    }

    // The delete entry survives for the next cycle
    assert_eq!(queue.store.pending_count().await.unwrap(), 1);
    queue.backend.set_delete_down(false);
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();
    assert!(!queue.backend.contains(&doomed.doc_ref()));
}

#[tokio::test]
async fn test_outage_then_rejection_counts_only_real_failures() {
    let queue = TestQueue::new();
    let post = Post::new(1, "post");
    queue.save(&post).await;

    // Two outages in a row leave the attempt counter alone
    queue.backend.set_down(true);
    for _ in 0..2 {
        queue
            .engine
            .process(&ProcessOptions::default())
            .await
            .unwrap();
    }

    queue.backend.set_down(false);
    queue.backend.reject(post.doc_ref());
    queue
        .engine
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    let due = queue.store.find_due(10, None).await.unwrap();
    assert!(due.is_empty(), "entry is backing off");
    assert_eq!(queue.store.pending_count().await.unwrap(), 1);

    // Exactly one failure recorded despite three attempts at dispatch
    let entry = queue
        .store
        .upsert(indexq_types::EntryChange::new(
            "Post",
            1,
            indexq_types::Operation::Index,
        ))
        .await
        .unwrap();
    assert_eq!(entry.attempt_count, 1);
}
