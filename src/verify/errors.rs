//! Verification error types
//!
//! Error codes:
//! - TPCC_VERIFY_CONFIG_INVALID (FATAL)
//! - TPCC_VERIFY_QUERY_FAILED (FATAL)
//! - TPCC_VERIFY_DECODE_FAILED (FATAL)
//! - TPCC_VERIFY_VIOLATION (ERROR)
//! - TPCC_VERIFY_CANCELLED (ERROR)
//! - TPCC_VERIFY_WORKER_FAILED (FATAL)
//!
//! A violation is a detected data defect, not a fault of the verifier,
//! so it carries ERROR severity. Everything that prevents a trustworthy
//! answer is FATAL for the run.

use std::fmt;

use serde::Serialize;

use crate::invariant::Condition;
use crate::numeric::Delta;
use crate::source::SourceError;

/// Severity levels for verification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// The dataset or the run is in a reportable but well-understood state
    Error,
    /// The verifier could not produce a trustworthy answer
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Verification error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyErrorCode {
    /// Worker count, worker index, warehouse count or tolerance is invalid
    ConfigInvalid,
    /// The query interface reported an error
    QueryFailed,
    /// A scan returned an unexpected column shape or type
    DecodeFailed,
    /// A consistency condition produced a non-zero delta
    Violation,
    /// The run was cancelled by the caller
    Cancelled,
    /// A worker could not start or terminated abnormally
    WorkerFailed,
}

impl VerifyErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            VerifyErrorCode::ConfigInvalid => "TPCC_VERIFY_CONFIG_INVALID",
            VerifyErrorCode::QueryFailed => "TPCC_VERIFY_QUERY_FAILED",
            VerifyErrorCode::DecodeFailed => "TPCC_VERIFY_DECODE_FAILED",
            VerifyErrorCode::Violation => "TPCC_VERIFY_VIOLATION",
            VerifyErrorCode::Cancelled => "TPCC_VERIFY_CANCELLED",
            VerifyErrorCode::WorkerFailed => "TPCC_VERIFY_WORKER_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            VerifyErrorCode::Violation | VerifyErrorCode::Cancelled => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for VerifyErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Verification error with attribution
#[derive(Debug)]
pub struct VerifyError {
    code: VerifyErrorCode,
    message: String,
    condition: Option<Condition>,
    warehouse: Option<u32>,
    delta: Option<Delta>,
    worker: Option<usize>,
}

impl VerifyError {
    fn new(code: VerifyErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            condition: None,
            warehouse: None,
            delta: None,
            worker: None,
        }
    }

    /// Create a configuration error
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        Self::new(VerifyErrorCode::ConfigInvalid, reason)
    }

    /// Create a consistency violation
    pub fn violation(condition: Condition, warehouse: u32, delta: Delta) -> Self {
        let mut err = Self::new(
            VerifyErrorCode::Violation,
            format!(
                "check condition {} failed: {} should be 0 in warehouse {}, but got {}",
                condition.index(),
                condition.expression(),
                warehouse,
                delta
            ),
        );
        err.condition = Some(condition);
        err.warehouse = Some(warehouse);
        err.delta = Some(delta);
        err
    }

    /// Wrap an error raised by the query interface.
    ///
    /// A cancelled scan becomes a cancellation, never a query failure.
    pub fn from_source(condition: Condition, warehouse: u32, source: SourceError) -> Self {
        let code = if source.is_cancelled() {
            VerifyErrorCode::Cancelled
        } else {
            VerifyErrorCode::QueryFailed
        };
        let mut err = Self::new(
            code,
            format!(
                "check condition {} in warehouse {}: {}",
                condition.index(),
                warehouse,
                source
            ),
        );
        err.condition = Some(condition);
        err.warehouse = Some(warehouse);
        err
    }

    /// Create a scan-result decoding error
    pub fn decode_failed(condition: Condition, warehouse: u32, reason: impl Into<String>) -> Self {
        let mut err = Self::new(
            VerifyErrorCode::DecodeFailed,
            format!(
                "check condition {} in warehouse {}: {}",
                condition.index(),
                warehouse,
                reason.into()
            ),
        );
        err.condition = Some(condition);
        err.warehouse = Some(warehouse);
        err
    }

    /// Create a cancellation observed between scans
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::new(VerifyErrorCode::Cancelled, reason)
    }

    /// Create a worker failure
    pub fn worker_failed(reason: impl Into<String>) -> Self {
        Self::new(VerifyErrorCode::WorkerFailed, reason)
    }

    /// Attach the worker that raised the error
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> VerifyErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the failing condition, if any
    pub fn condition(&self) -> Option<Condition> {
        self.condition
    }

    /// Returns the 1-based index of the failing condition, if any
    pub fn condition_index(&self) -> Option<u8> {
        self.condition.map(|c| c.index())
    }

    /// Returns the warehouse being checked, if any
    pub fn warehouse(&self) -> Option<u32> {
        self.warehouse
    }

    /// Returns the observed delta for violations
    pub fn delta(&self) -> Option<Delta> {
        self.delta
    }

    /// Returns the worker that raised the error, if known
    pub fn worker(&self) -> Option<usize> {
        self.worker
    }

    /// Returns whether this is a consistency violation
    pub fn is_violation(&self) -> bool {
        self.code == VerifyErrorCode::Violation
    }

    /// Returns whether this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        self.code == VerifyErrorCode::Cancelled
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Structured failure record for reports
    pub fn failure(&self) -> Failure {
        Failure {
            code: self.code.code(),
            severity: self.severity(),
            condition: self.condition_index(),
            warehouse: self.warehouse,
            delta: self.delta,
            worker: self.worker,
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for VerifyError {}

/// Serializable failure record: `{condition, warehouse, delta, message}`
/// plus the code, severity and worker that observed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub code: &'static str,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<usize>,
    pub message: String,
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerifyError>;
