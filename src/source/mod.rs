//! Aggregate source: the consumed query interface
//!
//! The verifier treats the query engine as an opaque, synchronous
//! collaborator: "execute a warehouse-scoped aggregate, return scalar rows".
//! Each worker owns its own source handle; nothing here is global.
//!
//! Contract for implementations:
//! - Honour the cancellation token: a scan that observes cancellation must
//!   return `SourceError::Cancelled` promptly
//! - Zero rows is `Ok(vec![])`, distinct from any error
//! - Never retry internally; transient failures are returned as-is

mod errors;
pub mod memory;

pub use errors::{SourceError, SourceResult};
pub use memory::{MemoryDataset, MemorySource};

use tokio_util::sync::CancellationToken;

use rust_decimal::Decimal;

use crate::invariant::Condition;

/// A single column value returned by a scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// SQL NULL
    Null,
    /// Whole number
    Int(i64),
    /// Exact decimal
    Decimal(Decimal),
    /// Floating point
    Float(f64),
    /// Text (never a valid aggregate result)
    Text(String),
}

impl ScalarValue {
    /// Name of the value's type, for decoding diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "NULL",
            ScalarValue::Int(_) => "INTEGER",
            ScalarValue::Decimal(_) => "DECIMAL",
            ScalarValue::Float(_) => "FLOAT",
            ScalarValue::Text(_) => "TEXT",
        }
    }
}

/// One result row
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRow {
    columns: Vec<ScalarValue>,
}

impl ScalarRow {
    /// Creates a row from its columns
    pub fn new(columns: Vec<ScalarValue>) -> Self {
        Self { columns }
    }

    /// Creates a single-column row
    pub fn single(value: ScalarValue) -> Self {
        Self {
            columns: vec![value],
        }
    }

    /// Column values in order
    pub fn columns(&self) -> &[ScalarValue] {
        &self.columns
    }
}

/// A warehouse-scoped aggregate query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedQuery {
    /// Condition the query evaluates
    pub condition: Condition,
    /// SQL text for engines that execute SQL
    pub sql: &'static str,
    /// Positional integer parameters (one or two)
    pub params: Vec<i64>,
}

impl ScopedQuery {
    /// The warehouse id the query is scoped to
    pub fn warehouse(&self) -> Option<i64> {
        self.params.first().copied()
    }
}

/// Synchronous, cancellation-aware aggregate query capability
pub trait AggregateSource {
    /// Executes a scoped aggregate and returns its rows.
    fn query(
        &mut self,
        cancel: &CancellationToken,
        query: &ScopedQuery,
    ) -> SourceResult<Vec<ScalarRow>>;
}

impl<S: AggregateSource + ?Sized> AggregateSource for &mut S {
    fn query(
        &mut self,
        cancel: &CancellationToken,
        query: &ScopedQuery,
    ) -> SourceResult<Vec<ScalarRow>> {
        (**self).query(cancel, query)
    }
}

impl<S: AggregateSource + ?Sized> AggregateSource for Box<S> {
    fn query(
        &mut self,
        cancel: &CancellationToken,
        query: &ScopedQuery,
    ) -> SourceResult<Vec<ScalarRow>> {
        (**self).query(cancel, query)
    }
}
