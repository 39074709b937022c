//! Verification counters
//!
//! - Counters only, monotonic
//! - Shared by all workers of a run through `Arc`
//! - Relaxed atomics: totals are read once workers have joined

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Run-wide counters
#[derive(Debug, Default)]
pub struct VerifyMetrics {
    scans_issued: AtomicU64,
    warehouses_verified: AtomicU64,
    violations_detected: AtomicU64,
    workers_failed: AtomicU64,
}

impl VerifyMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scan sent to the query interface
    pub fn increment_scans(&self) {
        self.scans_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one warehouse that passed every condition
    pub fn increment_warehouses(&self) {
        self.warehouses_verified.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one detected violation
    pub fn increment_violations(&self) {
        self.violations_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one worker that ended with a failure
    pub fn increment_workers_failed(&self) {
        self.workers_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans_issued: self.scans_issued.load(Ordering::Relaxed),
            warehouses_verified: self.warehouses_verified.load(Ordering::Relaxed),
            violations_detected: self.violations_detected.load(Ordering::Relaxed),
            workers_failed: self.workers_failed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub scans_issued: u64,
    pub warehouses_verified: u64,
    pub violations_detected: u64,
    pub workers_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(VerifyMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(VerifyMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_scans();
                    }
                    m.increment_warehouses();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.scans_issued, 400);
        assert_eq!(snap.warehouses_verified, 4);
        assert_eq!(snap.violations_detected, 0);
    }
}
