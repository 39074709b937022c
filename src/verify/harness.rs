//! Run harness
//!
//! Drives a fixed pool of workers, one blocking task per worker index,
//! each over its own source handle. Workers share nothing but the
//! read-only checker, the counters and a run-scoped cancellation token.
//!
//! # Failure policy
//!
//! - `halt_on_first`: the first failure cancels the run token; peers stop
//!   at their next scan and are reported as aborted, not failed
//! - `collect_all`: every worker runs to completion or to its own first
//!   failure
//!
//! A caller cancellation (the outer token) cancels every worker and makes
//! the run `cancelled` unless a failure had already been recorded.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event, VerifyMetrics};
use crate::source::{AggregateSource, SourceResult};

use super::driver::ConsistencyChecker;
use super::errors::{VerifyError, VerifyResult};
use super::report::{FailurePolicy, RunOutcome, RunReport, WorkerOutcome};

/// Shape of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Total worker count `T`; partitions are always computed against it
    pub workers: usize,
    /// Failure policy
    pub policy: FailurePolicy,
    /// Run only this worker index (a slice of a larger distributed run)
    pub only_worker: Option<usize>,
}

impl RunOptions {
    /// All `workers` workers under the given policy
    pub fn new(workers: usize, policy: FailurePolicy) -> Self {
        Self {
            workers,
            policy,
            only_worker: None,
        }
    }

    fn selected_workers(&self) -> VerifyResult<Vec<usize>> {
        if self.workers == 0 {
            return Err(VerifyError::config_invalid("worker count must be >= 1"));
        }
        match self.only_worker {
            Some(i) if i >= self.workers => Err(VerifyError::config_invalid(format!(
                "worker index {} out of range for {} workers",
                i, self.workers
            ))),
            Some(i) => Ok(vec![i]),
            None => Ok((0..self.workers).collect()),
        }
    }
}

/// Runs the selected workers concurrently and aggregates their results.
///
/// `open` is called once per worker, on that worker's thread, to obtain
/// its own source handle. Only configuration errors are returned as `Err`;
/// everything observed after workers start is part of the report.
pub async fn run_workers<S, F>(
    checker: ConsistencyChecker,
    options: RunOptions,
    open: F,
    cancel: CancellationToken,
) -> VerifyResult<RunReport>
where
    S: AggregateSource + Send + 'static,
    F: Fn(usize) -> SourceResult<S> + Send + Sync + 'static,
{
    let selected = options.selected_workers()?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let metrics = Arc::new(VerifyMetrics::new());
    let checker = Arc::new(checker.with_metrics(Arc::clone(&metrics)));
    let open = Arc::new(open);
    let run_token = cancel.child_token();

    let run_id_str = run_id.to_string();
    let warehouses_str = checker.warehouses().to_string();
    let workers_str = options.workers.to_string();
    log_event_with_fields(
        Event::RunStart,
        &[
            ("run_id", run_id_str.as_str()),
            ("warehouses", warehouses_str.as_str()),
            ("workers", workers_str.as_str()),
        ],
    );

    let mut tasks = JoinSet::new();
    for worker in selected {
        let checker = Arc::clone(&checker);
        let open = Arc::clone(&open);
        let token = run_token.clone();
        let total = options.workers;

        tasks.spawn_blocking(move || {
            let result = catch_unwind(AssertUnwindSafe(|| match (*open)(worker) {
                Ok(mut source) => checker.run_consistency_check(&mut source, &token, worker, total),
                Err(e) => Err(VerifyError::worker_failed(format!(
                    "worker {} cannot open source: {}",
                    worker, e
                ))
                .with_worker(worker)),
            }))
            .unwrap_or_else(|_| {
                Err(VerifyError::worker_failed(format!("worker {} panicked", worker))
                    .with_worker(worker))
            });
            (worker, result)
        });
    }

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    let mut first_failure = None;

    while let Some(joined) = tasks.join_next().await {
        let (worker, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                // Workers are never aborted, so this is a runtime shutdown
                let failure = VerifyError::worker_failed(format!("worker task lost: {}", e)).failure();
                metrics.increment_workers_failed();
                first_failure.get_or_insert_with(|| failure.clone());
                failures.push(failure);
                run_token.cancel();
                continue;
            }
        };

        match result {
            Ok(report) => outcomes.push(WorkerOutcome::Passed(report)),
            Err(e) if e.is_cancelled() => {
                if cancel.is_cancelled() {
                    outcomes.push(WorkerOutcome::Cancelled {
                        worker_index: worker,
                    });
                } else {
                    let w = worker.to_string();
                    log_event_with_fields(Event::WorkerAborted, &[("worker", w.as_str())]);
                    outcomes.push(WorkerOutcome::Aborted {
                        worker_index: worker,
                    });
                }
            }
            Err(e) => {
                metrics.increment_workers_failed();
                let failure = e.failure();
                first_failure.get_or_insert_with(|| failure.clone());
                failures.push(failure.clone());
                outcomes.push(WorkerOutcome::Failed(failure));
                if options.policy == FailurePolicy::HaltOnFirst {
                    run_token.cancel();
                }
            }
        }
    }

    outcomes.sort_by_key(|o| o.worker_index());
    failures.sort_by_key(|f| f.worker.unwrap_or(usize::MAX));

    let outcome = if !failures.is_empty() {
        RunOutcome::Failed
    } else if outcomes
        .iter()
        .any(|o| matches!(o, WorkerOutcome::Cancelled { .. }))
    {
        RunOutcome::Cancelled
    } else {
        RunOutcome::Passed
    };

    let report = RunReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        warehouses: checker.warehouses(),
        workers: options.workers,
        policy: options.policy,
        outcome,
        first_failure,
        failures,
        worker_outcomes: outcomes,
        metrics: metrics.snapshot(),
    };

    let failed = report.failures.len().to_string();
    let fields = [("run_id", run_id_str.as_str()), ("failures", failed.as_str())];
    match report.outcome {
        RunOutcome::Passed => log_event_with_fields(Event::RunComplete, &fields),
        RunOutcome::Failed => log_event_with_fields(Event::RunFailed, &fields),
        RunOutcome::Cancelled => log_event_with_fields(Event::RunCancelled, &fields),
    }

    Ok(report)
}
