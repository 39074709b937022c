//! CLI command implementations
//!
//! `check` follows a strict order:
//! 1. Resolve configuration (file, then command-line overrides) and validate
//! 2. Load the snapshot dataset
//! 3. Start the runtime and the Ctrl-C watcher
//! 4. Run every selected worker
//! 5. Print the report; exit non-zero unless it passed

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::config::CheckConfig;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::partition::assign_all;
use crate::source::{MemoryDataset, MemorySource};
use crate::verify::{run_workers, ConsistencyChecker, FailurePolicy, RunOptions, RunOutcome};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CheckOverrides {
    pub dataset: Option<PathBuf>,
    pub warehouses: Option<u32>,
    pub threads: Option<usize>,
    pub collect_all: bool,
    pub worker: Option<usize>,
    pub log_level: Option<String>,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check {
            config,
            dataset,
            warehouses,
            threads,
            collect_all,
            worker,
            log_level,
        } => check(
            config.as_deref(),
            CheckOverrides {
                dataset,
                warehouses,
                threads,
                collect_all,
                worker,
                log_level,
            },
        ),
        Command::Partition {
            warehouses,
            threads,
        } => partition(warehouses, threads),
    }
}

/// Loads the config file (or defaults) and applies overrides
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &CheckOverrides,
) -> CliResult<CheckConfig> {
    let mut config = match config_path {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::default(),
    };

    if let Some(dataset) = &overrides.dataset {
        config.dataset_path = Some(dataset.clone());
    }
    if let Some(w) = overrides.warehouses {
        config.warehouses = Some(w);
    }
    if let Some(t) = overrides.threads {
        config.threads = t;
    }
    if overrides.collect_all {
        config.failure_policy = FailurePolicy::CollectAll;
    }
    if let Some(level) = &overrides.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Verify a snapshot and print the run report
pub fn check(config_path: Option<&Path>, overrides: CheckOverrides) -> CliResult<()> {
    let config = resolve_config(config_path, &overrides)?;
    Logger::set_min_severity(config.severity()?);

    let threads = config.threads.to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("threads", threads.as_str())]);

    let dataset_path = config.dataset_path.clone().ok_or_else(|| {
        CliError::config_error("no dataset: pass --dataset or set dataset_path")
    })?;
    let dataset = Arc::new(MemoryDataset::load(&dataset_path)?);

    let path = dataset_path.display().to_string();
    let count = dataset.warehouse_count().to_string();
    log_event_with_fields(
        Event::DatasetLoaded,
        &[("path", path.as_str()), ("warehouses", count.as_str())],
    );

    let warehouses = config.resolve_warehouses(dataset.warehouse_count())?;
    let checker = ConsistencyChecker::new(warehouses, config.float_tolerance)?;
    let mut options = RunOptions::new(config.threads, config.failure_policy);
    options.only_worker = overrides.worker;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime_error(format!("failed to start runtime: {}", e)))?;

    let report = runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    Logger::warn("INTERRUPT_RECEIVED", &[]);
                    cancel.cancel();
                }
            })
        };

        let result = run_workers(
            checker,
            options,
            move |_| Ok(MemorySource::new(Arc::clone(&dataset))),
            cancel,
        )
        .await;
        watcher.abort();
        result
    })?;

    write_json(&report)?;

    match report.outcome {
        RunOutcome::Passed => Ok(()),
        RunOutcome::Failed => {
            let detail = report
                .first_failure
                .as_ref()
                .map(|f| f.message.clone())
                .unwrap_or_default();
            Err(CliError::verification_failed(format!(
                "run {} failed: {}",
                report.run_id, detail
            )))
        }
        RunOutcome::Cancelled => Err(CliError::verification_failed(format!(
            "run {} cancelled",
            report.run_id
        ))),
    }
}

/// Print every worker's warehouse assignment
pub fn partition(warehouses: u32, threads: usize) -> CliResult<()> {
    let assignments = assign_all(threads, warehouses)?;
    let workers: Vec<_> = assignments
        .into_iter()
        .enumerate()
        .map(|(worker, ids)| json!({ "worker": worker, "warehouses": ids }))
        .collect();

    write_json(&json!({
        "warehouses": warehouses,
        "threads": threads,
        "assignments": workers,
    }))
}
