//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tpcc_verify::source::memory::{
    DistrictRow, NewOrderRow, OrderLineRow, OrderRow, Snapshot, WarehouseRow,
};
use tpcc_verify::source::{
    AggregateSource, MemoryDataset, MemorySource, ScalarRow, ScopedQuery, SourceResult,
};

/// Shape of a synthetic dataset
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub warehouses: u32,
    pub districts: u32,
    pub orders: i64,
    /// Trailing orders of each district still marked as new-orders
    pub undelivered: i64,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            warehouses: 3,
            districts: 4,
            orders: 12,
            undelivered: 4,
        }
    }
}

pub fn money(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// A snapshot that satisfies all four conditions
pub fn consistent_snapshot(shape: Shape) -> Snapshot {
    let mut s = Snapshot::default();
    let district_ytd = money("30000.00");

    for w_id in 1..=shape.warehouses {
        let mut w_ytd = Decimal::ZERO;
        for d_id in 1..=shape.districts {
            w_ytd = w_ytd.checked_add(district_ytd).unwrap();
            s.district.push(DistrictRow {
                d_w_id: w_id,
                d_id,
                d_ytd: district_ytd,
                d_next_o_id: shape.orders + 1,
            });

            for o_id in 1..=shape.orders {
                let ol_cnt = 5 + o_id % 11;
                s.orders.push(OrderRow {
                    o_w_id: w_id,
                    o_d_id: d_id,
                    o_id,
                    o_ol_cnt: ol_cnt,
                });
                for ol_number in 1..=ol_cnt as u32 {
                    s.order_line.push(OrderLineRow {
                        ol_w_id: w_id,
                        ol_d_id: d_id,
                        ol_o_id: o_id,
                        ol_number,
                    });
                }
            }

            for no_o_id in (shape.orders - shape.undelivered + 1)..=shape.orders {
                s.new_order.push(NewOrderRow {
                    no_w_id: w_id,
                    no_d_id: d_id,
                    no_o_id,
                });
            }
        }
        s.warehouse.push(WarehouseRow { w_id, w_ytd });
    }
    s
}

pub fn dataset(snapshot: Snapshot) -> Arc<MemoryDataset> {
    Arc::new(MemoryDataset::from_snapshot(snapshot))
}

/// Wraps a source and records every scan as (condition index, warehouse)
pub struct RecordingSource<S> {
    pub inner: S,
    pub issued: Vec<(u8, u32)>,
}

impl<S> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            issued: Vec::new(),
        }
    }

    pub fn issued_for(&self, warehouse: u32) -> Vec<u8> {
        self.issued
            .iter()
            .filter(|(_, w)| *w == warehouse)
            .map(|(c, _)| *c)
            .collect()
    }
}

impl<S: AggregateSource> AggregateSource for RecordingSource<S> {
    fn query(
        &mut self,
        cancel: &CancellationToken,
        query: &ScopedQuery,
    ) -> SourceResult<Vec<ScalarRow>> {
        self.issued
            .push((query.condition.index(), query.warehouse().unwrap_or(0) as u32));
        self.inner.query(cancel, query)
    }
}

pub fn recording(dataset: &Arc<MemoryDataset>) -> RecordingSource<MemorySource> {
    RecordingSource::new(MemorySource::new(Arc::clone(dataset)))
}
