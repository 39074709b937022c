//! Verification driver
//!
//! Runs one worker's pass over its partition:
//!
//! 1. Resolve the partition for `(worker_index, total_workers, W)`
//! 2. For each warehouse, ascending: check the cancellation token
//! 3. Evaluate conditions 1, 2, 3, 4 in that order
//! 4. Stop at the first violation or error; nothing further is scanned
//!
//! A worker with an empty partition succeeds without issuing any scan.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::invariant::{CheckOutcome, Condition};
use crate::observability::{log_event_with_fields, Event, ObservationScope, VerifyMetrics};
use crate::partition::Partition;
use crate::source::AggregateSource;

use super::errors::{VerifyError, VerifyResult};

/// Summary of a worker that verified its whole partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker_index: usize,
    pub warehouses_checked: u32,
    pub scans_issued: u64,
}

/// Run-wide verification settings shared by every worker
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    warehouses: u32,
    float_tolerance: f64,
    metrics: Option<Arc<VerifyMetrics>>,
}

impl ConsistencyChecker {
    /// Creates a checker for warehouses `1..=warehouses`.
    ///
    /// `float_tolerance` only applies to deltas an engine reports as
    /// floats; it must be finite and non-negative.
    pub fn new(warehouses: u32, float_tolerance: f64) -> VerifyResult<Self> {
        if warehouses == 0 {
            return Err(VerifyError::config_invalid("warehouse count must be >= 1"));
        }
        if !float_tolerance.is_finite() || float_tolerance < 0.0 {
            return Err(VerifyError::config_invalid(format!(
                "float tolerance must be finite and >= 0, got {}",
                float_tolerance
            )));
        }
        Ok(Self {
            warehouses,
            float_tolerance,
            metrics: None,
        })
    }

    /// Records counters into a shared registry
    pub fn with_metrics(mut self, metrics: Arc<VerifyMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Number of warehouses in the run
    pub fn warehouses(&self) -> u32 {
        self.warehouses
    }

    /// Tolerance applied to float deltas
    pub fn float_tolerance(&self) -> f64 {
        self.float_tolerance
    }

    /// Verifies every warehouse assigned to `worker_index`.
    ///
    /// Returns the first failure with its condition, warehouse and delta.
    /// Cancellation yields `TPCC_VERIFY_CANCELLED`, never a violation.
    pub fn run_consistency_check<S: AggregateSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
        worker_index: usize,
        total_workers: usize,
    ) -> VerifyResult<WorkerReport> {
        let partition = Partition::new(worker_index, total_workers, self.warehouses)
            .map_err(|e| e.with_worker(worker_index))?;

        let worker = worker_index.to_string();
        let assigned = partition.len().to_string();
        let scope = ObservationScope::with_fields(
            "WORKER",
            &[("worker", worker.as_str()), ("assigned", assigned.as_str())],
        );

        let mut report = WorkerReport {
            worker_index,
            warehouses_checked: 0,
            scans_issued: 0,
        };

        for warehouse in partition.warehouse_ids() {
            if cancel.is_cancelled() {
                scope.abort("cancelled");
                return Err(VerifyError::cancelled(format!(
                    "worker {} cancelled before warehouse {}",
                    worker_index, warehouse
                ))
                .with_worker(worker_index));
            }

            if let Err(e) = self.check_warehouse(source, cancel, warehouse, &mut report) {
                if e.is_cancelled() {
                    scope.abort(e.message());
                } else {
                    scope.fail(e.message());
                }
                return Err(e.with_worker(worker_index));
            }

            report.warehouses_checked += 1;
        }

        let checked = report.warehouses_checked.to_string();
        let scans = report.scans_issued.to_string();
        scope.complete_with_fields(&[("warehouses", checked.as_str()), ("scans", scans.as_str())]);
        Ok(report)
    }

    /// Evaluates conditions 1 to 4 for one warehouse, stopping at the
    /// first failure.
    fn check_warehouse<S: AggregateSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
        warehouse: u32,
        report: &mut WorkerReport,
    ) -> VerifyResult<()> {
        for condition in Condition::ALL {
            report.scans_issued += 1;
            if let Some(metrics) = &self.metrics {
                metrics.increment_scans();
            }

            let outcome = condition.evaluate(source, cancel, warehouse, self.float_tolerance)?;
            if let CheckOutcome::Violation(delta) = outcome {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_violations();
                }
                let index = condition.index().to_string();
                let w = warehouse.to_string();
                let d = delta.to_string();
                log_event_with_fields(
                    Event::ConditionViolated,
                    &[
                        ("condition", index.as_str()),
                        ("warehouse", w.as_str()),
                        ("delta", d.as_str()),
                    ],
                );
                return Err(VerifyError::violation(condition, warehouse, delta));
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.increment_warehouses();
        }
        let w = warehouse.to_string();
        log_event_with_fields(Event::WarehouseVerified, &[("warehouse", w.as_str())]);
        Ok(())
    }
}
