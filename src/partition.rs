//! Partition assigner
//!
//! Splits the warehouse id space `1..=W` across `T` workers with a stride:
//! worker `t` owns `(i % W) + 1` for every `i` in `t, t+T, t+2T, ... < W`.
//!
//! # Invariants
//!
//! - The union of all partitions is exactly `{1..=W}`, no duplicates
//! - A partition is a pure function of `(t, T, W)`; no coordination
//! - Ids within a partition are strictly ascending
//! - `T > W` leaves the trailing workers with an empty partition

use serde::Serialize;

use crate::verify::{VerifyError, VerifyResult};

/// The set of warehouses one worker must verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    worker_index: usize,
    total_workers: usize,
    warehouses: u32,
}

impl Partition {
    /// Creates the partition for `worker_index` of `total_workers`.
    ///
    /// Fails when there are no workers, no warehouses, or the worker index
    /// is out of range.
    pub fn new(worker_index: usize, total_workers: usize, warehouses: u32) -> VerifyResult<Self> {
        if total_workers == 0 {
            return Err(VerifyError::config_invalid("worker count must be >= 1"));
        }
        if warehouses == 0 {
            return Err(VerifyError::config_invalid("warehouse count must be >= 1"));
        }
        if worker_index >= total_workers {
            return Err(VerifyError::config_invalid(format!(
                "worker index {} out of range for {} workers",
                worker_index, total_workers
            )));
        }

        Ok(Self {
            worker_index,
            total_workers,
            warehouses,
        })
    }

    /// Iterates the assigned warehouse ids in ascending order
    pub fn warehouse_ids(&self) -> impl Iterator<Item = u32> {
        let warehouses = self.warehouses as usize;
        (self.worker_index % self.total_workers..warehouses)
            .step_by(self.total_workers)
            .map(move |i| (i % warehouses) as u32 + 1)
    }

    /// Number of assigned warehouses
    pub fn len(&self) -> usize {
        let warehouses = self.warehouses as usize;
        if self.worker_index >= warehouses {
            return 0;
        }
        (warehouses - self.worker_index).div_ceil(self.total_workers)
    }

    /// True when this worker has nothing to verify
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes every worker's assignment for a run, indexed by worker
pub fn assign_all(total_workers: usize, warehouses: u32) -> VerifyResult<Vec<Vec<u32>>> {
    (0..total_workers)
        .map(|t| Partition::new(t, total_workers, warehouses).map(|p| p.warehouse_ids().collect()))
        .collect()
}
