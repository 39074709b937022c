//! Observable verification events
//!
//! Events are explicit and typed; the logged name is the stable string.
//! Worker passes are logged through `ObservationScope` (`WORKER_*`).

use std::fmt;

use super::logger::Severity;

/// Observable events of a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Setup
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Snapshot dataset loaded
    DatasetLoaded,

    // Run
    /// Run begins
    RunStart,
    /// Every worker passed
    RunComplete,
    /// At least one worker failed
    RunFailed,
    /// The caller cancelled the run
    RunCancelled,

    // Worker
    /// Worker stopped because a peer failed
    WorkerAborted,

    // Checks
    /// All conditions passed for one warehouse
    WarehouseVerified,
    /// A condition produced a non-zero delta
    ConditionViolated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatasetLoaded => "DATASET_LOADED",

            Event::RunStart => "VERIFY_RUN_BEGIN",
            Event::RunComplete => "VERIFY_RUN_COMPLETE",
            Event::RunFailed => "VERIFY_RUN_FAILED",
            Event::RunCancelled => "VERIFY_RUN_CANCELLED",

            Event::WorkerAborted => "WORKER_HALTED",

            Event::WarehouseVerified => "WAREHOUSE_VERIFIED",
            Event::ConditionViolated => "CONDITION_VIOLATED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::WarehouseVerified => Severity::Trace,
            Event::WorkerAborted | Event::RunCancelled => Severity::Warn,
            Event::ConditionViolated | Event::RunFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_unique() {
        let events = [
            Event::ConfigLoaded,
            Event::DatasetLoaded,
            Event::RunStart,
            Event::RunComplete,
            Event::RunFailed,
            Event::RunCancelled,
            Event::WorkerAborted,
            Event::WarehouseVerified,
            Event::ConditionViolated,
        ];
        let mut names: Vec<&str> = events.iter().map(|e| e.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), events.len());
    }

    #[test]
    fn test_violation_logged_as_error() {
        assert_eq!(Event::ConditionViolated.severity(), Severity::Error);
        assert_eq!(Event::WarehouseVerified.severity(), Severity::Trace);
    }
}
