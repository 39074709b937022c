//! In-memory snapshot engine
//!
//! Holds the five tables the consistency conditions read (warehouse,
//! district, orders, new_order, order_line) and answers each condition's
//! aggregate with the row shape its SQL produces. Snapshots load from JSON
//! using the benchmark schema's column names. Monetary columns accept
//! decimal strings (`"300000.00"`) or plain JSON numbers.
//!
//! Rows are grouped by warehouse on load so a scan only touches the
//! warehouse it is scoped to. The dataset is immutable once built and is
//! shared between workers through `Arc`; each worker gets its own
//! `MemorySource` handle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{AggregateSource, ScalarRow, ScalarValue, ScopedQuery, SourceError, SourceResult};
use crate::invariant::Condition;

/// `warehouse` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseRow {
    pub w_id: u32,
    pub w_ytd: Decimal,
}

/// `district` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictRow {
    pub d_w_id: u32,
    pub d_id: u32,
    pub d_ytd: Decimal,
    pub d_next_o_id: i64,
}

/// `orders` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub o_w_id: u32,
    pub o_d_id: u32,
    pub o_id: i64,
    pub o_ol_cnt: i64,
}

/// `new_order` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderRow {
    pub no_w_id: u32,
    pub no_d_id: u32,
    pub no_o_id: i64,
}

/// `order_line` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRow {
    pub ol_w_id: u32,
    pub ol_d_id: u32,
    pub ol_o_id: i64,
    pub ol_number: u32,
}

/// Raw table contents as stored in a snapshot file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub warehouse: Vec<WarehouseRow>,
    #[serde(default)]
    pub district: Vec<DistrictRow>,
    #[serde(default)]
    pub orders: Vec<OrderRow>,
    #[serde(default)]
    pub new_order: Vec<NewOrderRow>,
    #[serde(default)]
    pub order_line: Vec<OrderLineRow>,
}

#[derive(Debug, Default)]
struct DistrictData {
    ytd: Option<Decimal>,
    next_o_id: Option<i64>,
    /// (o_id, o_ol_cnt)
    orders: Vec<(i64, i64)>,
    new_orders: Vec<i64>,
    order_lines: i64,
}

#[derive(Debug, Default)]
struct WarehouseData {
    ytd: Option<Decimal>,
    districts: BTreeMap<u32, DistrictData>,
}

/// Immutable, warehouse-indexed snapshot
#[derive(Debug, Default)]
pub struct MemoryDataset {
    warehouses: BTreeMap<u32, WarehouseData>,
    max_warehouse_id: u32,
}

fn overflow() -> SourceError {
    SourceError::Query("numeric overflow in aggregate".to_string())
}

fn checkpoint(cancel: &CancellationToken) -> SourceResult<()> {
    if cancel.is_cancelled() {
        return Err(SourceError::Cancelled);
    }
    Ok(())
}

fn int_value(v: i128) -> SourceResult<ScalarValue> {
    match i64::try_from(v) {
        Ok(v) => Ok(ScalarValue::Int(v)),
        Err(_) => Decimal::try_from_i128_with_scale(v, 0)
            .map(ScalarValue::Decimal)
            .map_err(|_| overflow()),
    }
}

impl MemoryDataset {
    /// Builds the warehouse index from raw tables
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut warehouses: BTreeMap<u32, WarehouseData> = BTreeMap::new();
        let mut max_warehouse_id = 0;

        for row in snapshot.warehouse {
            max_warehouse_id = max_warehouse_id.max(row.w_id);
            warehouses.entry(row.w_id).or_default().ytd = Some(row.w_ytd);
        }
        for row in snapshot.district {
            let district = warehouses
                .entry(row.d_w_id)
                .or_default()
                .districts
                .entry(row.d_id)
                .or_default();
            district.ytd = Some(row.d_ytd);
            district.next_o_id = Some(row.d_next_o_id);
        }
        for row in snapshot.orders {
            warehouses
                .entry(row.o_w_id)
                .or_default()
                .districts
                .entry(row.o_d_id)
                .or_default()
                .orders
                .push((row.o_id, row.o_ol_cnt));
        }
        for row in snapshot.new_order {
            warehouses
                .entry(row.no_w_id)
                .or_default()
                .districts
                .entry(row.no_d_id)
                .or_default()
                .new_orders
                .push(row.no_o_id);
        }
        for row in snapshot.order_line {
            warehouses
                .entry(row.ol_w_id)
                .or_default()
                .districts
                .entry(row.ol_d_id)
                .or_default()
                .order_lines += 1;
        }

        Self {
            warehouses,
            max_warehouse_id,
        }
    }

    /// Parses a JSON snapshot
    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::Open(format!("invalid snapshot JSON: {}", e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Loads a JSON snapshot file
    pub fn load(path: &Path) -> SourceResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SourceError::Open(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Highest warehouse id present in the `warehouse` table.
    ///
    /// Used as the default warehouse count `W` for a run.
    pub fn warehouse_count(&self) -> u32 {
        self.max_warehouse_id
    }

    /// Evaluates a condition's aggregate for one warehouse
    pub fn aggregate(
        &self,
        cancel: &CancellationToken,
        condition: Condition,
        warehouse: u32,
    ) -> SourceResult<Vec<ScalarRow>> {
        checkpoint(cancel)?;
        let data = match self.warehouses.get(&warehouse) {
            Some(data) => data,
            None => {
                // count(*) over nothing still yields its single row
                return Ok(match condition {
                    Condition::OrderLineCounts => vec![ScalarRow::single(ScalarValue::Int(0))],
                    _ => Vec::new(),
                });
            }
        };

        match condition {
            Condition::WarehouseYtd => Self::warehouse_ytd(cancel, data),
            Condition::DistrictOrderIds => Self::district_order_ids(cancel, data),
            Condition::NewOrderDensity => Self::new_order_density(cancel, data),
            Condition::OrderLineCounts => Self::order_line_counts(cancel, data),
        }
    }

    fn warehouse_ytd(
        cancel: &CancellationToken,
        data: &WarehouseData,
    ) -> SourceResult<Vec<ScalarRow>> {
        let w_ytd = match data.ytd {
            Some(ytd) => ytd,
            None => return Ok(Vec::new()),
        };

        let mut sum: Option<Decimal> = None;
        for district in data.districts.values() {
            checkpoint(cancel)?;
            if let Some(d_ytd) = district.ytd {
                let acc = sum.unwrap_or(Decimal::ZERO);
                sum = Some(acc.checked_add(d_ytd).ok_or_else(overflow)?);
            }
        }

        match sum {
            Some(sum) => {
                let diff = sum.checked_sub(w_ytd).ok_or_else(overflow)?;
                Ok(vec![ScalarRow::single(ScalarValue::Decimal(diff))])
            }
            None => Ok(Vec::new()),
        }
    }

    fn district_order_ids(
        cancel: &CancellationToken,
        data: &WarehouseData,
    ) -> SourceResult<Vec<ScalarRow>> {
        let mut rows = Vec::new();
        for district in data.districts.values() {
            checkpoint(cancel)?;
            let next_o_id = match district.next_o_id {
                Some(v) => v as i128,
                None => continue,
            };
            let max_o_id = match district.orders.iter().map(|(id, _)| *id).max() {
                Some(v) => v as i128,
                None => continue,
            };

            let expected = next_o_id - 1;
            let order_dev = expected - max_o_id;
            let new_order_dev = match district.new_orders.iter().max() {
                Some(max_no) => expected - *max_no as i128,
                None => 0,
            };

            let diff = order_dev
                .checked_mul(order_dev)
                .zip(new_order_dev.checked_mul(new_order_dev))
                .and_then(|(a, b)| a.checked_add(b))
                .ok_or_else(overflow)?;
            rows.push(ScalarRow::single(int_value(diff)?));
        }
        Ok(rows)
    }

    fn new_order_density(
        cancel: &CancellationToken,
        data: &WarehouseData,
    ) -> SourceResult<Vec<ScalarRow>> {
        let mut rows = Vec::new();
        for district in data.districts.values() {
            checkpoint(cancel)?;
            let ids = &district.new_orders;
            let (min, max) = match (ids.iter().min(), ids.iter().max()) {
                (Some(min), Some(max)) => (*min as i128, *max as i128),
                _ => continue,
            };
            let diff = max - min + 1 - ids.len() as i128;
            rows.push(ScalarRow::single(int_value(diff)?));
        }
        Ok(rows)
    }

    fn order_line_counts(
        cancel: &CancellationToken,
        data: &WarehouseData,
    ) -> SourceResult<Vec<ScalarRow>> {
        let mut mismatched: i64 = 0;
        for district in data.districts.values() {
            checkpoint(cancel)?;
            // Districts with orders or order-lines; a missing side counts as 0
            if district.orders.is_empty() && district.order_lines == 0 {
                continue;
            }
            let declared = district
                .orders
                .iter()
                .try_fold(0i64, |acc, (_, cnt)| acc.checked_add(*cnt))
                .ok_or_else(overflow)?;
            if declared != district.order_lines {
                mismatched += 1;
            }
        }
        Ok(vec![ScalarRow::single(ScalarValue::Int(mismatched))])
    }
}

/// Per-worker handle onto a shared `MemoryDataset`
#[derive(Debug, Clone)]
pub struct MemorySource {
    dataset: Arc<MemoryDataset>,
    scans_served: u64,
}

impl MemorySource {
    /// Creates a handle onto a shared dataset
    pub fn new(dataset: Arc<MemoryDataset>) -> Self {
        Self {
            dataset,
            scans_served: 0,
        }
    }

    /// Number of scans this handle has answered
    pub fn scans_served(&self) -> u64 {
        self.scans_served
    }
}

impl AggregateSource for MemorySource {
    fn query(
        &mut self,
        cancel: &CancellationToken,
        query: &ScopedQuery,
    ) -> SourceResult<Vec<ScalarRow>> {
        let warehouse = query
            .warehouse()
            .and_then(|w| u32::try_from(w).ok())
            .ok_or_else(|| {
                SourceError::Query(format!("invalid warehouse parameter {:?}", query.params))
            })?;
        self.scans_served += 1;
        self.dataset.aggregate(cancel, query.condition, warehouse)
    }
}
