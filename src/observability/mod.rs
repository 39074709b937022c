//! Observability for verification runs
//!
//! - Structured JSON logging to stderr
//! - Typed lifecycle events
//! - Scope-based begin/complete logging
//! - Run-wide counters
//!
//! Observability is read-only: nothing here influences a verdict.

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, VerifyMetrics};
pub use scope::ObservationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
