//! Janitor for evicting terminated tasks.
//!
//! Terminal tasks stay queryable for a retention window so pollers can
//! still read their outcome, then get evicted to keep the registry from
//! growing without bound. The sweep runs on an explicit repeating timer
//! rather than any framework scheduling, and eviction itself is an
//! atomic remove-if-expired inside the registry, so a sweep can never
//! race a live worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::registry::TaskRegistry;
use crate::task::TaskId;
use crate::{plog_debug, plog_trace};

/// Configuration for janitor behavior.
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// How long terminated tasks stay queryable after their end time.
    pub retention: Duration,
    /// How often the sweep runs.
    pub sweep_interval: Duration,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 3600),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

/// Report of one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Tasks that were evicted.
    pub evicted: Vec<TaskId>,
    /// Tasks still registered after the sweep.
    pub remaining: usize,
}

impl SweepReport {
    pub fn evicted_count(&self) -> usize {
        self.evicted.len()
    }
}

/// Periodic sweeper over a task registry.
pub struct TaskJanitor {
    registry: Arc<TaskRegistry>,
    config: JanitorConfig,
}

impl TaskJanitor {
    pub fn new(registry: Arc<TaskRegistry>, config: JanitorConfig) -> Self {
        Self { registry, config }
    }

    /// Evict every terminal task whose end time is past the retention
    /// window. Live tasks are never touched.
    pub fn sweep(&self) -> SweepReport {
        let evicted = self.registry.evict_expired(self.config.retention, Utc::now());
        let report = SweepReport {
            evicted,
            remaining: self.registry.len(),
        };
        if report.evicted_count() > 0 {
            plog_debug!(
                "janitor evicted {} tasks, {} remaining",
                report.evicted_count(),
                report.remaining
            );
        } else {
            plog_trace!("janitor sweep: nothing to evict");
        }
        report
    }

    /// Run the sweep on a repeating timer until `shutdown` fires.
    ///
    /// Ticks that pile up behind a slow sweep are skipped rather than
    /// burst-executed.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    plog_debug!("janitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }
    }
}
