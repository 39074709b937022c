//! tpcc-verify - A strict, deterministic consistency verifier for
//! TPC-C style order-processing datasets
//!
//! After a benchmark run the verifier scans the populated snapshot and
//! confirms the four cross-table consistency conditions hold exactly for
//! every warehouse. Warehouses are split across a fixed pool of workers;
//! each worker stops at its first violation and reports the condition,
//! the warehouse and the offending delta.

pub mod cli;
pub mod config;
pub mod invariant;
pub mod numeric;
pub mod observability;
pub mod partition;
pub mod source;
pub mod verify;
