//! Verification subsystem
//!
//! # Flow
//!
//! 1. The harness validates the run shape and spawns one worker per index
//! 2. Each worker resolves its partition and opens its own source
//! 3. The driver evaluates conditions 1-4 per warehouse, ascending
//! 4. The first violation or error ends that worker's pass
//! 5. The harness folds worker outcomes into a `RunReport`
//!
//! # Invariants
//!
//! - Every warehouse in `1..=W` is checked by exactly one worker
//! - Within a worker, warehouses ascend and conditions run 1, 2, 3, 4
//! - Cancellation is reported as cancellation, never as a violation
//! - No scan is retried

mod driver;
mod errors;
pub mod harness;
mod report;

pub use driver::{ConsistencyChecker, WorkerReport};
pub use errors::{Failure, Severity, VerifyError, VerifyErrorCode, VerifyResult};
pub use harness::{run_workers, RunOptions};
pub use report::{FailurePolicy, RunOutcome, RunReport, WorkerOutcome};
