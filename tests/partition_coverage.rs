//! Partition Coverage Tests
//!
//! Every warehouse is assigned to exactly one worker, and surplus
//! workers finish without touching the dataset.

mod common;

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;
use tpcc_verify::partition::{assign_all, Partition};
use tpcc_verify::verify::ConsistencyChecker;

use common::{consistent_snapshot, dataset, recording, Shape};

// =============================================================================
// Completeness
// =============================================================================

/// Union over all workers is {1..=W}, each id exactly once.
#[test]
fn test_union_is_exact_for_all_shapes() {
    for w in 1..=40u32 {
        for t in 1..=12usize {
            let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
            for ids in assign_all(t, w).unwrap() {
                for id in ids {
                    *seen.entry(id).or_default() += 1;
                }
            }
            let expected: Vec<u32> = (1..=w).collect();
            assert_eq!(seen.keys().copied().collect::<Vec<_>>(), expected, "W={} T={}", w, t);
            assert!(seen.values().all(|n| *n == 1), "duplicate for W={} T={}", w, t);
        }
    }
}

/// Assignment does not depend on which worker asks first.
#[test]
fn test_assignment_is_order_independent() {
    let forward: Vec<Vec<u32>> = (0..5)
        .map(|t| Partition::new(t, 5, 23).unwrap().warehouse_ids().collect())
        .collect();
    let mut backward: Vec<Vec<u32>> = (0..5)
        .rev()
        .map(|t| Partition::new(t, 5, 23).unwrap().warehouse_ids().collect())
        .collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

/// Partitions are balanced to within one warehouse.
#[test]
fn test_partitions_balanced() {
    let sizes: Vec<usize> = assign_all(7, 100).unwrap().iter().map(|p| p.len()).collect();
    let min = *sizes.iter().min().unwrap();
    let max = *sizes.iter().max().unwrap();
    assert!(max - min <= 1);
}

// =============================================================================
// Emptiness
// =============================================================================

/// With T > W, workers >= W get nothing and succeed without scanning.
#[test]
fn test_surplus_workers_issue_no_scans() {
    let ds = dataset(consistent_snapshot(Shape {
        warehouses: 2,
        ..Shape::default()
    }));
    let checker = ConsistencyChecker::new(2, 0.0).unwrap();
    let token = CancellationToken::new();

    for worker in 2..5 {
        let mut source = recording(&ds);
        let report = checker
            .run_consistency_check(&mut source, &token, worker, 5)
            .unwrap();
        assert_eq!(report.warehouses_checked, 0);
        assert_eq!(report.scans_issued, 0);
        assert!(source.issued.is_empty());
    }

    for worker in 0..2 {
        let mut source = recording(&ds);
        let report = checker
            .run_consistency_check(&mut source, &token, worker, 5)
            .unwrap();
        assert_eq!(report.warehouses_checked, 1);
        assert_eq!(source.issued_for(worker as u32 + 1), vec![1, 2, 3, 4]);
    }
}
