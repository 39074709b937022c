//! Invariant query set
//!
//! The four consistency conditions of the order-processing benchmark
//! (clause 3.3.2), as a closed set of variants sharing one contract:
//! warehouse id -> pass, or violation with the observed delta.
//!
//! | # | Relationship |
//! |---|---|
//! | 1 | `W_YTD = sum(D_YTD)` |
//! | 2 | `D_NEXT_O_ID - 1 = max(O_ID) = max(NO_O_ID)` per district |
//! | 3 | `max(NO_O_ID) - min(NO_O_ID) + 1 = count(NEW_ORDER)` per district |
//! | 4 | `sum(O_OL_CNT) = count(ORDER_LINE)` per district |
//!
//! Each condition is one read-only scan. A scan may return zero rows; only
//! a non-zero delta is a violation. Rows are inspected in the order the
//! source returns them and the first non-zero delta is reported.

use std::fmt;

use tokio_util::sync::CancellationToken;

use rust_decimal::Decimal;

use crate::numeric::Delta;
use crate::source::{AggregateSource, ScalarRow, ScalarValue, ScopedQuery};
use crate::verify::{VerifyError, VerifyResult};

const SQL_WAREHOUSE_YTD: &str = "SELECT sum(d_ytd) - max(w_ytd) diff \
     FROM district, warehouse \
     WHERE d_w_id = w_id AND w_id = ? \
     GROUP BY d_w_id";

// Districts without new-order rows compare against themselves, so the
// second term vanishes instead of dropping the whole district.
const SQL_DISTRICT_ORDER_IDS: &str = "SELECT POWER(d_next_o_id - 1 - max(o_id), 2) \
     + POWER(d_next_o_id - 1 - COALESCE((SELECT max(no_o_id) FROM new_order \
     WHERE no_w_id = d_w_id AND no_d_id = d_id), d_next_o_id - 1), 2) diff \
     FROM district, orders \
     WHERE d_w_id = o_w_id AND d_id = o_d_id AND d_w_id = ? \
     GROUP BY d_w_id, d_id, d_next_o_id";

const SQL_NEW_ORDER_DENSITY: &str = "SELECT max(no_o_id) - min(no_o_id) + 1 - count(*) diff \
     FROM new_order \
     WHERE no_w_id = ? \
     GROUP BY no_d_id";

// Both sides feed one grouped stream, so orders without lines and lines
// without orders both surface as mismatching districts.
const SQL_ORDER_LINE_COUNTS: &str = "SELECT count(*) FROM (\
     SELECT d_id, sum(declared) sm1, sum(actual) cn FROM (\
     SELECT o_d_id d_id, o_ol_cnt declared, 0 actual FROM orders WHERE o_w_id = ? \
     UNION ALL \
     SELECT ol_d_id, 0, 1 FROM order_line WHERE ol_w_id = ?) u \
     GROUP BY d_id) t1 \
     WHERE sm1 <> cn";

/// One of the four consistency conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    /// Warehouse YTD equals the sum of its districts' YTD
    WarehouseYtd,
    /// District next-order counter agrees with max order and new-order ids
    DistrictOrderIds,
    /// New-order ids are contiguous per district
    NewOrderDensity,
    /// Declared order-line counts match actual order-line rows per district
    OrderLineCounts,
}

/// Result of evaluating one condition for one warehouse
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckOutcome {
    /// Every returned delta was zero (or no rows were returned)
    Pass,
    /// First non-zero delta observed
    Violation(Delta),
}

impl Condition {
    /// All conditions in their fixed evaluation order
    pub const ALL: [Condition; 4] = [
        Condition::WarehouseYtd,
        Condition::DistrictOrderIds,
        Condition::NewOrderDensity,
        Condition::OrderLineCounts,
    ];

    /// 1-based condition index
    pub fn index(&self) -> u8 {
        match self {
            Condition::WarehouseYtd => 1,
            Condition::DistrictOrderIds => 2,
            Condition::NewOrderDensity => 3,
            Condition::OrderLineCounts => 4,
        }
    }

    /// Looks up a condition by its 1-based index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get((index as usize).checked_sub(1)?).copied()
    }

    /// The expression whose value must be zero
    pub fn expression(&self) -> &'static str {
        match self {
            Condition::WarehouseYtd => "sum(d_ytd) - max(w_ytd)",
            Condition::DistrictOrderIds => {
                "POWER(d_next_o_id - 1 - max(o_id), 2) + POWER(d_next_o_id - 1 - max(no_o_id), 2)"
            }
            Condition::NewOrderDensity => "max(no_o_id) - min(no_o_id) + 1 - count(*)",
            Condition::OrderLineCounts => "count(districts where sum(o_ol_cnt) <> count(order_line))",
        }
    }

    /// SQL text of the condition's scan
    pub fn sql(&self) -> &'static str {
        match self {
            Condition::WarehouseYtd => SQL_WAREHOUSE_YTD,
            Condition::DistrictOrderIds => SQL_DISTRICT_ORDER_IDS,
            Condition::NewOrderDensity => SQL_NEW_ORDER_DENSITY,
            Condition::OrderLineCounts => SQL_ORDER_LINE_COUNTS,
        }
    }

    /// Builds the scan for `warehouse`, binding the id once per placeholder
    pub fn query(&self, warehouse: u32) -> ScopedQuery {
        let w = warehouse as i64;
        let params = match self {
            Condition::OrderLineCounts => vec![w, w],
            _ => vec![w],
        };
        ScopedQuery {
            condition: *self,
            sql: self.sql(),
            params,
        }
    }

    /// Runs the condition's scan for `warehouse` and compares every row
    /// against zero.
    ///
    /// Float deltas pass when `|delta| <= float_tolerance`; exact deltas
    /// must be exactly zero. Errors are attributed to this condition and
    /// warehouse.
    pub fn evaluate<S: AggregateSource + ?Sized>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
        warehouse: u32,
        float_tolerance: f64,
    ) -> VerifyResult<CheckOutcome> {
        let rows = source
            .query(cancel, &self.query(warehouse))
            .map_err(|e| VerifyError::from_source(*self, warehouse, e))?;

        for row in &rows {
            let delta = decode_delta(row)
                .map_err(|reason| VerifyError::decode_failed(*self, warehouse, reason))?;
            if !delta.is_zero_within(float_tolerance) {
                return Ok(CheckOutcome::Violation(delta));
            }
        }

        Ok(CheckOutcome::Pass)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "condition {}", self.index())
    }
}

/// Decodes a single-column numeric row into a delta
pub fn decode_delta(row: &ScalarRow) -> Result<Delta, String> {
    let columns = row.columns();
    if columns.len() != 1 {
        return Err(format!("expected 1 column, got {}", columns.len()));
    }
    match &columns[0] {
        ScalarValue::Int(v) => Ok(Delta::Exact(Decimal::from(*v))),
        ScalarValue::Decimal(v) => Ok(Delta::Exact(*v)),
        ScalarValue::Float(v) => Ok(Delta::Approx(*v)),
        other => Err(format!("unexpected {} value in diff column", other.type_name())),
    }
}
