//! Cooperative cancellation and terminal-latch behavior.

use std::sync::Arc;
use std::time::Duration;

use panovr::task::TaskStatus;

use crate::fixtures::{
    small_request, wait_for_processing, wait_for_terminal, GatedImageSource, TestHarness,
    TestStorage,
};

#[tokio::test]
async fn test_cancel_processing_task_stops_the_pipeline() {
    let (source, release) = GatedImageSource::new();
    let h = TestHarness::with_source(TestStorage::new(), Arc::new(source));

    let task = h
        .orchestrator
        .submit(small_request(vec!["/files/slow.png".to_string()]))
        .unwrap();
    wait_for_processing(&h.orchestrator, &task.task_id).await;

    assert!(h.orchestrator.cancel(&task.task_id));
    let snapshot = h.orchestrator.status(&task.task_id);
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert_eq!(snapshot.message, "task cancelled");
    assert!(snapshot.end_time.is_some());

    // Unblock the worker; it observes the token and abandons the rest,
    // so no result is ever written.
    let _ = release.send(());
    tokio::time::sleep(Duration::from_millis(150)).await;

    let after = h.orchestrator.status(&task.task_id);
    assert_eq!(after.status, TaskStatus::Cancelled);
    assert!(after.result_url.is_none());
    assert!(!h.storage.temp_dir.path().join("vr").exists());
}

#[tokio::test]
async fn test_cancel_is_rejected_outside_processing() {
    let h = TestHarness::new();
    let url = h.storage.seed_image("a.png", 8, 8, [1, 1, 1, 255]);

    // Unknown id.
    assert!(!h.orchestrator.cancel(&panovr::task::TaskId::new()));

    // Terminal task.
    let task = h.orchestrator.submit(small_request(vec![url])).unwrap();
    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(!h.orchestrator.cancel(&task.task_id));
    assert_eq!(
        h.orchestrator.status(&task.task_id).status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn test_cancel_pending_task_queued_behind_full_pool_returns_false() {
    let (source, release) = GatedImageSource::new();
    let h = TestHarness::with_source(TestStorage::new(), Arc::new(source));

    // Fill both worker slots with gated tasks, then queue a third.
    let first = h
        .orchestrator
        .submit(small_request(vec!["/files/1.png".to_string()]))
        .unwrap();
    let second = h
        .orchestrator
        .submit(small_request(vec!["/files/2.png".to_string()]))
        .unwrap();
    wait_for_processing(&h.orchestrator, &first.task_id).await;
    wait_for_processing(&h.orchestrator, &second.task_id).await;

    let queued = h
        .orchestrator
        .submit(small_request(vec!["/files/3.png".to_string()]))
        .unwrap();
    assert_eq!(
        h.orchestrator.status(&queued.task_id).status,
        TaskStatus::Pending
    );

    // Cancelling a Pending task is a no-op returning false.
    assert!(!h.orchestrator.cancel(&queued.task_id));
    assert_eq!(
        h.orchestrator.status(&queued.task_id).status,
        TaskStatus::Pending
    );

    // Drain the gates so the workers can finish.
    for _ in 0..8 {
        let _ = release.send(());
    }
    wait_for_terminal(&h.orchestrator, &queued.task_id).await;
}
