//! CLI module for tpcc-verify
//!
//! Provides command-line interface for:
//! - check: Verify a snapshot and print the run report
//! - partition: Print worker assignments

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, partition, run, run_command, CheckOverrides};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_json_to};
