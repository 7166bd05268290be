//! Full pipeline execution tests against filesystem collaborators.

use panovr::project::{ProjectId, ProjectLookup, ProjectStatus};
use panovr::request::ProcessingRequest;
use panovr::task::{TaskId, TaskStatus};
use panovr::Error;

use crate::fixtures::{small_request, wait_for_terminal, TestHarness, PROJECT};

#[tokio::test]
async fn test_two_image_panorama_completes_end_to_end() {
    let h = TestHarness::new();
    let left = h.storage.seed_image("photos/left.png", 32, 32, [200, 0, 0, 255]);
    let right = h.storage.seed_image("photos/right.png", 32, 32, [0, 0, 200, 255]);

    let task = h
        .orchestrator
        .submit(small_request(vec![left, right]))
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.progress, 0);

    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.progress, 100);
    assert!(done.duration_millis.is_some());

    // The result landed on disk at the requested dimensions.
    let path = h.result_path(&done);
    assert!(path.exists(), "missing result at {}", path.display());
    let written = image::open(&path).unwrap();
    assert_eq!((written.width(), written.height()), (400, 200));

    // And the result URL follows the public layout.
    let url = done.result_url.unwrap();
    assert!(url.starts_with("/files/vr/project_1/vr_1_"));
    assert!(url.ends_with(".jpg"));
}

#[tokio::test]
async fn test_completed_task_publishes_project_scene() {
    let h = TestHarness::new();
    let url = h.storage.seed_image("solo.png", 16, 16, [80, 80, 80, 255]);

    let task = h.orchestrator.submit(small_request(vec![url])).unwrap();
    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);

    let project = h.projects.find(PROJECT).unwrap();
    assert_eq!(project.status, ProjectStatus::Published);
    let scene = project.scene_data.unwrap();
    assert_eq!(scene["type"], "panorama");
    assert_eq!(scene["url"], done.result_url.unwrap().as_str());
}

#[tokio::test]
async fn test_missing_project_fails_submission_synchronously() {
    let h = TestHarness::new();
    let url = h.storage.seed_image("a.png", 8, 8, [1, 1, 1, 255]);

    let mut request = small_request(vec![url]);
    request.project_id = ProjectId(777);

    let err = h.orchestrator.submit(request).unwrap_err();
    assert!(matches!(err, Error::ProjectNotFound { .. }));
    // No task was registered for the rejected submission.
    assert!(h.orchestrator.list_all().is_empty());
}

#[tokio::test]
async fn test_empty_image_list_is_rejected_before_any_work() {
    let h = TestHarness::new();
    let err = h.orchestrator.submit(small_request(vec![])).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(h.orchestrator.list_all().is_empty());
}

#[tokio::test]
async fn test_unresolvable_image_fails_task_via_state_only() {
    let h = TestHarness::new();
    let good = h.storage.seed_image("good.png", 8, 8, [1, 1, 1, 255]);

    let task = h
        .orchestrator
        .submit(small_request(vec![good, "/files/nope.png".to_string()]))
        .unwrap();

    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Failed);
    assert!(done
        .error_detail
        .as_deref()
        .unwrap()
        .contains("/files/nope.png"));
    assert!(done.result_url.is_none());
    assert!(done.end_time.is_some());

    // The failed task stays in the registry for pollers.
    assert_eq!(h.orchestrator.list_all().len(), 1);
}

#[tokio::test]
async fn test_polling_unknown_task_returns_synthetic_record() {
    let h = TestHarness::new();
    let unknown = TaskId::new();
    let snapshot = h.orchestrator.status(&unknown);
    assert_eq!(snapshot.task_id, unknown);
    assert_eq!(snapshot.status, TaskStatus::NotFound);
    assert!(!snapshot.message.is_empty());
}

#[tokio::test]
async fn test_list_all_sees_every_submission() {
    let h = TestHarness::new();
    let a = h.storage.seed_image("a.png", 8, 8, [1, 1, 1, 255]);
    let b = h.storage.seed_image("b.png", 8, 8, [2, 2, 2, 255]);

    let first = h.orchestrator.submit(small_request(vec![a])).unwrap();
    let second = h.orchestrator.submit(small_request(vec![b])).unwrap();

    let ids: Vec<TaskId> = h
        .orchestrator
        .list_all()
        .iter()
        .map(|t| t.task_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.task_id));
    assert!(ids.contains(&second.task_id));

    wait_for_terminal(&h.orchestrator, &first.task_id).await;
    wait_for_terminal(&h.orchestrator, &second.task_id).await;
}

#[tokio::test]
async fn test_optimization_disabled_still_completes() {
    let h = TestHarness::new();
    let url = h.storage.seed_image("plain.png", 16, 16, [60, 70, 80, 255]);

    let mut request = small_request(vec![url]);
    request.options.enable_optimization = false;

    let task = h.orchestrator.submit(request).unwrap();
    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(h.result_path(&done).exists());
}

#[tokio::test]
async fn test_default_options_apply_from_the_wire() {
    let h = TestHarness::new();
    let url = h.storage.seed_image("wire.png", 8, 8, [9, 9, 9, 255]);

    // A caller-supplied JSON body with only the required fields.
    let json = format!(r#"{{"projectId": 1, "imageUrls": ["{}"]}}"#, url);
    let mut request: ProcessingRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(request.options.output_width, 4096);

    // Shrink the output so the test stays fast, keep everything else default.
    request.options.output_width = 64;
    request.options.output_height = 32;

    let task = h.orchestrator.submit(request).unwrap();
    let done = wait_for_terminal(&h.orchestrator, &task.task_id).await;
    assert_eq!(done.status, TaskStatus::Completed);
}
