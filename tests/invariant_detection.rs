//! Invariant Detection Tests
//!
//! Each condition is exercised against a consistent synthetic snapshot
//! and against a targeted corruption of it.

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tpcc_verify::invariant::{decode_delta, CheckOutcome, Condition};
use tpcc_verify::numeric::Delta;
use tpcc_verify::source::memory::{NewOrderRow, OrderLineRow, Snapshot};
use tpcc_verify::source::{MemoryDataset, MemorySource};
use tpcc_verify::verify::{ConsistencyChecker, VerifyErrorCode, VerifyResult};

use common::{consistent_snapshot, dataset, money, recording, Shape};

fn run_worker(snapshot: Snapshot, warehouses: u32) -> (VerifyResult<u32>, Vec<(u8, u32)>) {
    let ds = dataset(snapshot);
    let checker = ConsistencyChecker::new(warehouses, 0.0).unwrap();
    let mut source = recording(&ds);
    let result = checker
        .run_consistency_check(&mut source, &CancellationToken::new(), 0, 1)
        .map(|r| r.warehouses_checked);
    (result, source.issued)
}

fn deltas(ds: &MemoryDataset, condition: Condition, warehouse: u32) -> Vec<Delta> {
    ds.aggregate(&CancellationToken::new(), condition, warehouse)
        .unwrap()
        .iter()
        .map(|row| decode_delta(row).unwrap())
        .collect()
}

fn set_new_orders(s: &mut Snapshot, w: u32, d: u32, ids: &[i64]) {
    s.new_order.retain(|no| !(no.no_w_id == w && no.no_d_id == d));
    for id in ids {
        s.new_order.push(NewOrderRow {
            no_w_id: w,
            no_d_id: d,
            no_o_id: *id,
        });
    }
}

// =============================================================================
// Consistent baseline
// =============================================================================

/// A consistent snapshot passes every condition for every warehouse.
#[test]
fn test_consistent_snapshot_passes() {
    let (result, issued) = run_worker(consistent_snapshot(Shape::default()), 3);
    assert_eq!(result.unwrap(), 3);
    assert_eq!(issued.len(), 12);
}

/// Every delta of the consistent snapshot is exactly zero.
#[test]
fn test_consistent_deltas_are_zero() {
    let ds = MemoryDataset::from_snapshot(consistent_snapshot(Shape::default()));
    for condition in Condition::ALL {
        for delta in deltas(&ds, condition, 2) {
            assert!(delta.is_zero_within(0.0), "{} gave {}", condition, delta);
        }
    }
}

// =============================================================================
// Condition 1: W_YTD = sum(D_YTD)
// =============================================================================

/// Perturbing one district's YTD by epsilon fails with delta epsilon.
#[test]
fn test_condition1_detects_ytd_perturbation() {
    let mut s = consistent_snapshot(Shape::default());
    let idx = s
        .district
        .iter()
        .position(|d| d.d_w_id == 2 && d.d_id == 3)
        .unwrap();
    s.district[idx].d_ytd = money("30000.01");

    let (result, _) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.code(), VerifyErrorCode::Violation);
    assert_eq!(err.condition_index(), Some(1));
    assert_eq!(err.warehouse(), Some(2));
    assert_eq!(err.delta(), Some(Delta::Exact(money("0.01"))));
}

/// Exact arithmetic: decimal totals that do not sum exactly in binary
/// floating point still cancel.
#[test]
fn test_condition1_exact_decimal_sum() {
    let mut s = consistent_snapshot(Shape {
        warehouses: 1,
        districts: 3,
        ..Shape::default()
    });
    for (d, ytd) in s.district.iter_mut().zip(["0.10", "0.20", "0.30"]) {
        d.d_ytd = money(ytd);
    }
    s.warehouse[0].w_ytd = money("0.60");

    let mut source = MemorySource::new(Arc::new(MemoryDataset::from_snapshot(s)));
    let outcome = Condition::WarehouseYtd
        .evaluate(&mut source, &CancellationToken::new(), 1, 0.0)
        .unwrap();
    assert_eq!(outcome, CheckOutcome::Pass);
}

// =============================================================================
// Condition 2: D_NEXT_O_ID - 1 = max(O_ID) = max(NO_O_ID)
// =============================================================================

/// A stale next-order counter fails condition 2.
#[test]
fn test_condition2_detects_counter_drift() {
    let mut s = consistent_snapshot(Shape::default());
    let idx = s
        .district
        .iter()
        .position(|d| d.d_w_id == 1 && d.d_id == 2)
        .unwrap();
    s.district[idx].d_next_o_id += 1;

    let (result, _) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(2));
    assert_eq!(err.warehouse(), Some(1));
    // (13 - 12)^2 + (13 - 12)^2
    assert_eq!(err.delta(), Some(Delta::from(2)));
}

/// A district with no new-order rows does not fail condition 2.
#[test]
fn test_condition2_empty_new_order_set_passes() {
    let mut s = consistent_snapshot(Shape::default());
    set_new_orders(&mut s, 1, 1, &[]);
    let ds = MemoryDataset::from_snapshot(s.clone());
    assert!(deltas(&ds, Condition::DistrictOrderIds, 1)
        .iter()
        .all(|d| d.is_zero_within(0.0)));

    let (result, _) = run_worker(s, 3);
    assert_eq!(result.unwrap(), 3);
}

/// Emptiness only waives the new-order comparison, not the order one.
#[test]
fn test_condition2_empty_new_orders_still_checks_orders() {
    let mut s = consistent_snapshot(Shape::default());
    set_new_orders(&mut s, 3, 4, &[]);
    s.orders.retain(|o| !(o.o_w_id == 3 && o.o_d_id == 4 && o.o_id == 12));
    s.order_line
        .retain(|ol| !(ol.ol_w_id == 3 && ol.ol_d_id == 4 && ol.ol_o_id == 12));

    let (result, _) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(2));
    assert_eq!(err.warehouse(), Some(3));
    assert_eq!(err.delta(), Some(Delta::from(1)));
}

// =============================================================================
// Condition 3: new-order ids are dense
// =============================================================================

/// {1,2,4} has a gap: (4 - 1 + 1) - 3 = 1.
#[test]
fn test_condition3_detects_gap() {
    let mut s = consistent_snapshot(Shape {
        warehouses: 1,
        districts: 1,
        orders: 4,
        undelivered: 4,
    });
    set_new_orders(&mut s, 1, 1, &[1, 2, 4]);
    let ds = MemoryDataset::from_snapshot(s.clone());
    assert_eq!(deltas(&ds, Condition::NewOrderDensity, 1), vec![Delta::from(1)]);

    let (result, _) = run_worker(s, 1);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(3));
    assert_eq!(err.delta(), Some(Delta::from(1)));
}

/// {1,2,3} is contiguous: delta 0.
#[test]
fn test_condition3_contiguous_passes() {
    let mut s = consistent_snapshot(Shape {
        warehouses: 1,
        districts: 1,
        orders: 3,
        undelivered: 3,
    });
    set_new_orders(&mut s, 1, 1, &[1, 2, 3]);
    let ds = MemoryDataset::from_snapshot(s);
    assert_eq!(deltas(&ds, Condition::NewOrderDensity, 1), vec![Delta::from(0)]);
}

// =============================================================================
// Condition 4: sum(O_OL_CNT) = count(ORDER_LINE)
// =============================================================================

/// A missing order-line is reported as one mismatching district.
#[test]
fn test_condition4_counts_mismatching_districts() {
    let mut s = consistent_snapshot(Shape::default());
    s.order_line
        .retain(|ol| !(ol.ol_w_id == 2 && ol.ol_o_id == 1 && ol.ol_number == 1 && ol.ol_d_id <= 2));

    let (result, _) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(4));
    assert_eq!(err.warehouse(), Some(2));
    assert_eq!(err.delta(), Some(Delta::from(2)));
}

/// Order-lines in a district with no orders: declared 0, actual 5.
#[test]
fn test_condition4_detects_lines_without_orders() {
    let mut s = consistent_snapshot(Shape::default());
    for ol_number in 1..=5 {
        s.order_line.push(OrderLineRow {
            ol_w_id: 1,
            ol_d_id: 9,
            ol_o_id: 1,
            ol_number,
        });
    }
    let ds = MemoryDataset::from_snapshot(s.clone());
    assert_eq!(deltas(&ds, Condition::OrderLineCounts, 1), vec![Delta::from(1)]);

    let (result, issued) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(4));
    assert_eq!(err.warehouse(), Some(1));
    assert_eq!(err.delta(), Some(Delta::from(1)));
    assert_eq!(issued.len(), 4);
}

/// Orders whose lines are all missing count as actual 0.
#[test]
fn test_condition4_detects_orders_without_lines() {
    let mut s = consistent_snapshot(Shape::default());
    s.order_line.retain(|ol| !(ol.ol_w_id == 3 && ol.ol_d_id == 1));

    let (result, _) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(4));
    assert_eq!(err.warehouse(), Some(3));
    assert_eq!(err.delta(), Some(Delta::from(1)));
}

// =============================================================================
// Fixed order / fail-fast
// =============================================================================

/// When 1 and 3 both fail, 1 is reported and 3 is never scanned.
#[test]
fn test_lower_condition_reported_first() {
    let mut s = consistent_snapshot(Shape::default());
    s.warehouse[1].w_ytd = Decimal::ONE;
    set_new_orders(&mut s, 2, 1, &[9, 10, 12]);

    let (result, issued) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.condition_index(), Some(1));
    assert_eq!(err.warehouse(), Some(2));

    let for_w2: Vec<u8> = issued.iter().filter(|(_, w)| *w == 2).map(|(c, _)| *c).collect();
    assert_eq!(for_w2, vec![1]);
    assert!(!issued.iter().any(|(_, w)| *w == 3));
}

/// A violation in warehouse 1 stops the worker before warehouse 2.
#[test]
fn test_worker_halts_on_first_violation() {
    let mut s = consistent_snapshot(Shape::default());
    set_new_orders(&mut s, 1, 2, &[9, 11, 12]);
    s.warehouse[2].w_ytd = Decimal::ZERO;

    let (result, issued) = run_worker(s, 3);
    let err = result.unwrap_err();
    assert_eq!(err.warehouse(), Some(1));
    assert_eq!(err.condition_index(), Some(3));
    assert_eq!(issued, vec![(1, 1), (2, 1), (3, 1)]);
}
