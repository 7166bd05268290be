//! Processing task data model.
//!
//! A `ProcessingTask` is one unit of asynchronous panorama-generation work.
//! It tracks status, progress, timing and the eventual result URL or error.
//! The record is only ever mutated by the worker driving that task (plus
//! `cancel`), and every transition into a terminal state is a one-way
//! latch: the first writer wins, later attempts are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project::ProjectId;

/// Unique identifier for a processing task.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task status in its lifecycle.
///
/// `Pending -> Processing -> {Completed | Failed | Cancelled}`.
/// `NotFound` never lives in the registry; it only appears on the
/// synthetic record returned when polling an unknown task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Registered, waiting for a worker.
    Pending,
    /// A worker is executing the pipeline stages.
    Processing,
    /// Pipeline finished and the result was published.
    Completed,
    /// A stage failed; details are in `error_detail`.
    Failed,
    /// Cancelled while processing.
    Cancelled,
    /// Synthetic status for polling an unknown id.
    NotFound,
}

impl TaskStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Processing => write!(f, "PROCESSING"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
            TaskStatus::Failed => write!(f, "FAILED"),
            TaskStatus::Cancelled => write!(f, "CANCELLED"),
            TaskStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// One asynchronous panorama-generation task.
///
/// Progress moves through fixed checkpoints as stages complete:
/// 0 created, 10 loading, 30 loaded, 50 stitching, 70 projecting,
/// 80 optimizing (when enabled), 90 saving, 100 published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTask {
    /// Unique identifier for this task.
    pub task_id: TaskId,
    /// The project this panorama belongs to.
    pub project_id: ProjectId,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Completion percentage, 0-100, non-decreasing until terminal.
    pub progress: u8,
    /// Human-readable status line.
    pub message: String,
    /// Public URL of the generated panorama. Set only on Completed.
    pub result_url: Option<String>,
    /// Failure detail. Set only on Failed.
    pub error_detail: Option<String>,
    /// When the task was submitted.
    pub start_time: DateTime<Utc>,
    /// When the task reached a terminal state.
    pub end_time: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds, `end_time - start_time`.
    pub duration_millis: Option<i64>,
}

impl ProcessingTask {
    /// Create a freshly submitted task in Pending state.
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            task_id: TaskId::new(),
            project_id,
            status: TaskStatus::Pending,
            progress: 0,
            message: "task created, waiting to start".to_string(),
            result_url: None,
            error_detail: None,
            start_time: Utc::now(),
            end_time: None,
            duration_millis: None,
        }
    }

    /// Synthetic record for polling an id the registry does not hold.
    ///
    /// Pollers always receive a well-formed record, never an error.
    pub fn not_found(task_id: TaskId) -> Self {
        Self {
            task_id,
            project_id: ProjectId(0),
            status: TaskStatus::NotFound,
            progress: 0,
            message: "task does not exist".to_string(),
            result_url: None,
            error_detail: None,
            start_time: Utc::now(),
            end_time: None,
            duration_millis: None,
        }
    }

    /// Begin stage execution: Pending -> Processing.
    ///
    /// Returns false if the task is not Pending (already started,
    /// or raced into a terminal state).
    pub fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Processing;
        true
    }

    /// Record a progress checkpoint with a status message.
    ///
    /// Ignored once terminal. Progress is clamped to be non-decreasing,
    /// so a stale lower checkpoint can never move the bar backwards.
    pub fn set_progress(&mut self, progress: u8, message: &str) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.min(100));
        self.message = message.to_string();
    }

    /// Mark the task completed with its published result URL.
    ///
    /// Returns false (and changes nothing) if the task is already terminal.
    pub fn complete(&mut self, result_url: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.message = "panorama generation completed".to_string();
        self.result_url = Some(result_url.to_string());
        self.stamp_end();
        true
    }

    /// Mark the task failed with a failure detail.
    ///
    /// Returns false (and changes nothing) if the task is already terminal.
    pub fn fail(&mut self, error: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error_detail = Some(error.to_string());
        self.message = format!("processing failed: {}", error);
        self.stamp_end();
        true
    }

    /// Cancel the task. Only a Processing task can be cancelled; a
    /// Pending or terminal task is left untouched and false is returned.
    pub fn cancel(&mut self) -> bool {
        if self.status != TaskStatus::Processing {
            return false;
        }
        self.status = TaskStatus::Cancelled;
        self.message = "task cancelled".to_string();
        self.stamp_end();
        true
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn stamp_end(&mut self) {
        let end = Utc::now();
        self.end_time = Some(end);
        self.duration_millis = Some(end.signed_duration_since(self.start_time).num_milliseconds());
    }
}
