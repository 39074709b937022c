//! CLI argument definitions using clap
//!
//! Commands:
//! - tpcc-verify check --config <path> [--dataset <path>] [overrides]
//! - tpcc-verify partition --warehouses <W> --threads <T>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tpcc-verify - consistency verifier for TPC-C style datasets
#[derive(Parser, Debug)]
#[command(name = "tpcc-verify")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify the four consistency conditions and print a JSON report
    Check {
        /// Path to configuration file (optional)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON snapshot to verify (overrides `dataset_path`)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Warehouse count (overrides `warehouses`)
        #[arg(long)]
        warehouses: Option<u32>,

        /// Worker count (overrides `threads`)
        #[arg(long)]
        threads: Option<usize>,

        /// Report every worker's failure instead of stopping at the first
        #[arg(long)]
        collect_all: bool,

        /// Run only this worker index of the configured pool
        #[arg(long)]
        worker: Option<usize>,

        /// Minimum log severity (overrides `log_level`)
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Print every worker's warehouse assignment
    Partition {
        /// Warehouse count
        #[arg(long)]
        warehouses: u32,

        /// Worker count
        #[arg(long)]
        threads: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
