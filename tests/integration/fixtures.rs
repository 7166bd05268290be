//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Temp upload directories seeded with PNG images
//! - A fully wired orchestrator over filesystem collaborators
//! - An image source that blocks until released, for cancellation tests

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

use panovr::orchestrator::TaskOrchestrator;
use panovr::project::{InMemoryProjectStore, Project, ProjectId, ProjectLookup, ProjectUpdater};
use panovr::registry::TaskRegistry;
use panovr::request::{ProcessingOptions, ProcessingRequest};
use panovr::storage::{write_png, FsImageSource, FsResultSink, ImageSource, ResultSink};
use panovr::task::{ProcessingTask, TaskId};
use panovr::Result;

pub const BASE_URL: &str = "/files";

/// A temp upload directory that images can be seeded into.
pub struct TestStorage {
    /// Keeps the directory alive for the duration of the test.
    pub temp_dir: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write a solid-color PNG under the upload root and return its
    /// public URL.
    pub fn seed_image(&self, name: &str, w: u32, h: u32, rgba: [u8; 4]) -> String {
        let image = RgbaImage::from_pixel(w, h, Rgba(rgba));
        write_png(&self.temp_dir.path().join(name), &image).expect("Failed to write test image");
        format!("{}/{}", BASE_URL, name)
    }
}

/// An orchestrator wired over a temp directory, plus handles to poke at
/// the collaborators from tests.
pub struct TestHarness {
    pub storage: TestStorage,
    pub projects: Arc<InMemoryProjectStore>,
    pub registry: Arc<TaskRegistry>,
    pub orchestrator: TaskOrchestrator,
}

pub const PROJECT: ProjectId = ProjectId(1);

impl TestHarness {
    /// Harness with filesystem source and sink over one temp directory.
    pub fn new() -> Self {
        let storage = TestStorage::new();
        let source: Arc<dyn ImageSource> = Arc::new(FsImageSource::new(
            storage.temp_dir.path(),
            BASE_URL,
        ));
        Self::with_source(storage, source)
    }

    /// Harness with a custom image source (for failure/blocking tests).
    pub fn with_source(storage: TestStorage, source: Arc<dyn ImageSource>) -> Self {
        let projects = Arc::new(InMemoryProjectStore::new());
        projects.insert(Project::new(PROJECT, "integration project"));
        let registry = Arc::new(TaskRegistry::new());
        let sink: Arc<dyn ResultSink> =
            Arc::new(FsResultSink::new(storage.temp_dir.path(), BASE_URL));

        let orchestrator = TaskOrchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&projects) as Arc<dyn ProjectLookup>,
            Arc::clone(&projects) as Arc<dyn ProjectUpdater>,
            source,
            sink,
            2,
        );

        Self {
            storage,
            projects,
            registry,
            orchestrator,
        }
    }

    /// Filesystem path a completed result was written to.
    pub fn result_path(&self, task: &ProcessingTask) -> std::path::PathBuf {
        self.storage.temp_dir.path().join(format!(
            "vr/project_{}/vr_{}_{}.jpg",
            task.project_id, task.project_id, task.task_id
        ))
    }
}

/// Request for `urls` with a small output so tests stay fast.
pub fn small_request(urls: Vec<String>) -> ProcessingRequest {
    let mut request = ProcessingRequest::new(PROJECT, urls);
    request.options = ProcessingOptions {
        output_width: 400,
        output_height: 200,
        quality: 90,
        enable_optimization: true,
    };
    request
}

/// Poll until the task reaches a terminal state.
pub async fn wait_for_terminal(orchestrator: &TaskOrchestrator, id: &TaskId) -> ProcessingTask {
    for _ in 0..1000 {
        let snapshot = orchestrator.status(id);
        if snapshot.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} never reached a terminal state", id);
}

/// Poll until the task is Processing.
pub async fn wait_for_processing(orchestrator: &TaskOrchestrator, id: &TaskId) {
    for _ in 0..1000 {
        if orchestrator.status(id).status == panovr::task::TaskStatus::Processing {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} never started processing", id);
}

/// Image source whose reads block until the returned sender fires.
pub struct GatedImageSource {
    gate: Mutex<mpsc::Receiver<()>>,
}

impl GatedImageSource {
    pub fn new() -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                gate: Mutex::new(rx),
            },
            tx,
        )
    }
}

impl ImageSource for GatedImageSource {
    fn read(&self, _reference: &str) -> Result<RgbaImage> {
        let gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        let _ = gate.recv_timeout(Duration::from_secs(10));
        Ok(RgbaImage::from_pixel(8, 8, Rgba([5, 5, 5, 255])))
    }
}
