//! In-memory, concurrency-safe store of task state.
//!
//! The registry is the only state shared between the submitting caller,
//! the workers, pollers, and the janitor. Records are replaced wholesale
//! under the write lock and handed out as clones, so a reader can never
//! observe a half-updated task. All terminal-state rules (the one-way
//! latch, monotonic progress) live on [`ProcessingTask`] itself; the
//! registry only adds the locking and the eviction primitive.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::task::{ProcessingTask, TaskId};

/// Mapping from task id to task state.
///
/// Explicitly constructed and passed to the orchestrator and janitor,
/// one instance per service (or per test).
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, ProcessingTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    // A poisoned lock only means some writer panicked mid-closure.
    // Records are replaced wholesale, so the map itself stays usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, ProcessingTask>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, ProcessingTask>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a task under its id. A task id is never reused, so this
    /// only ever inserts a fresh entry.
    pub fn insert(&self, task: ProcessingTask) {
        self.write().insert(task.task_id, task);
    }

    /// Snapshot of a task by id.
    pub fn get(&self, id: &TaskId) -> Option<ProcessingTask> {
        self.read().get(id).cloned()
    }

    /// Snapshot for the polling path: unknown ids yield a synthetic
    /// `NOT_FOUND` record instead of an error.
    pub fn status_of(&self, id: &TaskId) -> ProcessingTask {
        self.get(id)
            .unwrap_or_else(|| ProcessingTask::not_found(*id))
    }

    /// Mutate a task in place under the write lock.
    ///
    /// Returns `None` if the id is unknown (e.g. already evicted),
    /// otherwise the closure's result. Keep closures small; the lock is
    /// held for their duration.
    pub fn update<R>(&self, id: &TaskId, f: impl FnOnce(&mut ProcessingTask) -> R) -> Option<R> {
        self.write().get_mut(id).map(f)
    }

    /// Snapshot of every registered task, in no particular order.
    pub fn list_all(&self) -> Vec<ProcessingTask> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every task that is terminal and whose end time is older
    /// than `retention` relative to `now`. The check and the removal
    /// happen atomically under the write lock, so a sweep can never race
    /// a worker into removing a task that is still live.
    ///
    /// Returns the ids that were evicted.
    pub fn evict_expired(&self, retention: Duration, now: DateTime<Utc>) -> Vec<TaskId> {
        let mut evicted = Vec::new();
        self.write().retain(|id, task| {
            let expired = task.is_terminal()
                && task.end_time.is_some_and(|end| {
                    let age = now.signed_duration_since(end);
                    age.num_milliseconds() >= 0 && age.num_milliseconds() as u128 > retention.as_millis()
                });
            if expired {
                evicted.push(*id);
            }
            !expired
        });
        evicted
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
