//! Task orchestration: submit, execute, poll, cancel.
//!
//! The orchestrator validates a request, registers a Pending task and
//! spawns the pipeline body without blocking the caller (the caller
//! polls by task id; the spawn handle is deliberately discarded).
//! Workers draw permits from a bounded semaphore, run the CPU-heavy
//! stages on the blocking pool, and publish every state change through
//! the shared [`TaskRegistry`].
//!
//! Cancellation is cooperative: `cancel` latches the task into the
//! Cancelled state and fires the task's `CancellationToken`; the worker
//! observes the token between stages and abandons the rest of the
//! pipeline. A worker that was already past the last check simply has
//! its final complete/fail rejected by the terminal latch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::imaging::{optimize, project, stitch};
use crate::project::{ProjectLookup, ProjectUpdater};
use crate::registry::TaskRegistry;
use crate::request::ProcessingRequest;
use crate::storage::{ImageSource, ResultSink};
use crate::task::{ProcessingTask, TaskId};
use crate::{plog, plog_debug, plog_error, Result};

/// Drives processing tasks from submission to a terminal state.
pub struct TaskOrchestrator {
    registry: Arc<TaskRegistry>,
    projects: Arc<dyn ProjectLookup>,
    updater: Arc<dyn ProjectUpdater>,
    images: Arc<dyn ImageSource>,
    sink: Arc<dyn ResultSink>,
    workers: Arc<Semaphore>,
    cancellations: Arc<Mutex<HashMap<TaskId, CancellationToken>>>,
}

impl TaskOrchestrator {
    /// Create an orchestrator over the given registry and collaborators.
    ///
    /// `max_concurrent` bounds how many pipelines run at once; further
    /// submissions queue as Pending until a worker permit frees up.
    pub fn new(
        registry: Arc<TaskRegistry>,
        projects: Arc<dyn ProjectLookup>,
        updater: Arc<dyn ProjectUpdater>,
        images: Arc<dyn ImageSource>,
        sink: Arc<dyn ResultSink>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            registry,
            projects,
            updater,
            images,
            sink,
            workers: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancellations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Shared registry handle, for wiring up the janitor.
    pub fn registry(&self) -> Arc<TaskRegistry> {
        Arc::clone(&self.registry)
    }

    /// Submit a processing request.
    ///
    /// Returns the Pending task snapshot immediately; the pipeline runs
    /// asynchronously and is observed via [`TaskOrchestrator::status`].
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a request that can
    /// never succeed and [`crate::Error::ProjectNotFound`] if the
    /// referenced project does not exist. In both cases no task is
    /// registered.
    pub fn submit(&self, request: ProcessingRequest) -> Result<ProcessingTask> {
        request.validate()?;
        self.projects.find(request.project_id)?;

        let task = ProcessingTask::new(request.project_id);
        let task_id = task.task_id;
        plog!(
            "submitting task {}: project={}, images={}",
            task_id.short(),
            request.project_id,
            request.image_urls.len()
        );
        self.registry.insert(task.clone());

        let token = CancellationToken::new();
        self.cancellations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(task_id, token.clone());

        let worker = PipelineWorker {
            registry: Arc::clone(&self.registry),
            updater: Arc::clone(&self.updater),
            images: Arc::clone(&self.images),
            sink: Arc::clone(&self.sink),
            token,
            task_id,
            request,
        };
        let permits = Arc::clone(&self.workers);
        let cancellations = Arc::clone(&self.cancellations);

        // Fire and forget: the caller already holds the task id.
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let _ = tokio::task::spawn_blocking(move || worker.run()).await;
            cancellations
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&task_id);
        });

        Ok(task)
    }

    /// Poll a task by id. Always returns a well-formed record; an
    /// unknown id yields a synthetic `NOT_FOUND` snapshot.
    pub fn status(&self, id: &TaskId) -> ProcessingTask {
        self.registry.status_of(id)
    }

    /// Cancel a task. Returns true only if the task was Processing and
    /// is now Cancelled; Pending, terminal or unknown tasks are left
    /// untouched and false is returned.
    pub fn cancel(&self, id: &TaskId) -> bool {
        let cancelled = self.registry.update(id, |t| t.cancel()).unwrap_or(false);
        if cancelled {
            if let Some(token) = self
                .cancellations
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(id)
            {
                token.cancel();
            }
            plog!("task {} cancelled", id.short());
        }
        cancelled
    }

    /// Snapshot of every registered task.
    pub fn list_all(&self) -> Vec<ProcessingTask> {
        self.registry.list_all()
    }
}

/// The body of one task's pipeline, run on the blocking pool.
struct PipelineWorker {
    registry: Arc<TaskRegistry>,
    updater: Arc<dyn ProjectUpdater>,
    images: Arc<dyn ImageSource>,
    sink: Arc<dyn ResultSink>,
    token: CancellationToken,
    task_id: TaskId,
    request: ProcessingRequest,
}

impl PipelineWorker {
    fn run(self) {
        let id = self.task_id;
        if self.registry.update(&id, |t| t.start()) != Some(true) {
            // Evicted while queued, or raced into a terminal state.
            plog_debug!("task {} gone before start, skipping", id.short());
            return;
        }

        match self.stages() {
            Ok(Some(result_url)) => {
                if self.registry.update(&id, |t| t.complete(&result_url)) == Some(true) {
                    let duration = self
                        .registry
                        .get(&id)
                        .and_then(|t| t.duration_millis)
                        .unwrap_or_default();
                    plog!(
                        "task {} completed in {}ms: {}",
                        id.short(),
                        duration,
                        result_url
                    );
                }
            }
            Ok(None) => {
                plog_debug!("task {} stopped by cancellation", id.short());
            }
            Err(e) => {
                if self.registry.update(&id, |t| t.fail(&e.to_string())) == Some(true) {
                    plog_error!("task {} failed: {}", id.short(), e);
                }
            }
        }
    }

    /// Run the pipeline stages in order, reporting progress checkpoints.
    ///
    /// Returns `Ok(None)` when a cancellation was observed at a stage
    /// boundary; the task record was already latched by `cancel`.
    fn stages(&self) -> Result<Option<String>> {
        let options = &self.request.options;

        self.progress(10, "loading images");
        let mut images = Vec::with_capacity(self.request.image_urls.len());
        for reference in &self.request.image_urls {
            if self.token.is_cancelled() {
                return Ok(None);
            }
            // Fail fast: one unreadable image fails the whole task.
            images.push(self.images.read(reference)?);
        }
        self.progress(30, "images loaded");

        if self.token.is_cancelled() {
            return Ok(None);
        }
        self.progress(50, "stitching panorama");
        let panorama = stitch(&images, options.output_width, options.output_height)?;

        if self.token.is_cancelled() {
            return Ok(None);
        }
        self.progress(70, "applying spherical projection");
        let mut vr_image = project(&panorama);

        if options.enable_optimization {
            if self.token.is_cancelled() {
                return Ok(None);
            }
            self.progress(80, "optimizing image");
            vr_image = optimize(vr_image, options.quality);
        }

        if self.token.is_cancelled() {
            return Ok(None);
        }
        self.progress(90, "saving result");
        let result_url = self.sink.save(
            &vr_image,
            self.request.project_id,
            self.task_id,
            options.quality,
        )?;
        self.updater
            .attach_result(self.request.project_id, &result_url)?;

        Ok(Some(result_url))
    }

    fn progress(&self, checkpoint: u8, message: &str) {
        self.registry
            .update(&self.task_id, |t| t.set_progress(checkpoint, message));
    }
}
