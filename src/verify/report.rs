//! Run report
//!
//! The machine-readable verdict of one verification run, serialized as
//! JSON on stdout by the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observability::MetricsSnapshot;

use super::driver::WorkerReport;
use super::errors::Failure;

/// What the harness does after the first worker failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Cancel the remaining workers as soon as one fails
    #[default]
    HaltOnFirst,
    /// Let every worker finish its partition (or its own first failure)
    CollectAll,
}

/// Overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every selected worker verified its whole partition
    Passed,
    /// At least one worker reported a violation or error
    Failed,
    /// The caller cancelled the run before a verdict was reached
    Cancelled,
}

/// How one worker ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerOutcome {
    /// Whole partition verified
    Passed(WorkerReport),
    /// Stopped on a violation or error
    Failed(Failure),
    /// Stopped because a peer failed under `halt_on_first`
    Aborted { worker_index: usize },
    /// Stopped because the caller cancelled the run
    Cancelled { worker_index: usize },
}

impl WorkerOutcome {
    /// Worker this outcome belongs to
    pub fn worker_index(&self) -> usize {
        match self {
            WorkerOutcome::Passed(report) => report.worker_index,
            WorkerOutcome::Failed(failure) => failure.worker.unwrap_or(usize::MAX),
            WorkerOutcome::Aborted { worker_index } => *worker_index,
            WorkerOutcome::Cancelled { worker_index } => *worker_index,
        }
    }
}

/// Verdict of a verification run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub warehouses: u32,
    pub workers: usize,
    pub policy: FailurePolicy,
    pub outcome: RunOutcome,
    /// First failure observed, in completion order
    pub first_failure: Option<Failure>,
    /// Every failure, ordered by worker
    pub failures: Vec<Failure>,
    /// One entry per selected worker, ordered by worker
    pub worker_outcomes: Vec<WorkerOutcome>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    /// True when the run passed
    pub fn passed(&self) -> bool {
        self.outcome == RunOutcome::Passed
    }
}
