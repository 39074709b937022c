//! ObservationScope for start/complete logging around a unit of work
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` (with `elapsed_ms`) on `complete`
//! - Logs `{name}_FAILED` or `{name}_ABORTED` on early exit
//! - Logs `{name}_INCOMPLETE` if dropped without an outcome

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs the lifecycle of one unit of work
///
/// ```ignore
/// let scope = ObservationScope::with_fields("WORKER", &[("worker", "0")]);
/// // ... verify partition ...
/// scope.complete_with_fields(&[("warehouses", "12")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    fields: Vec<(&'a str, String)>,
    started: Instant,
    finished: bool,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope carrying fields on every line
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
            finished: false,
        }
    }

    fn merged<'b>(&'b self, extra: &[(&'b str, &'b str)]) -> Vec<(&'b str, &'b str)> {
        let mut all: Vec<(&str, &str)> = self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.extend(extra.iter().copied());
        all
    }

    /// Elapsed milliseconds since the scope began
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Mark the scope as completed with additional fields
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = self.merged(extra);
        fields.push(("elapsed_ms", &elapsed));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Mark the scope as failed (ERROR)
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let fields = self.merged(&[("reason", reason)]);
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    /// Mark the scope as stopped by cancellation (WARN)
    pub fn abort(mut self, reason: &str) {
        self.finished = true;
        let fields = self.merged(&[("reason", reason)]);
        Logger::warn(&format!("{}_ABORTED", self.name), &fields);
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let fields = self.merged(&[("reason", "scope dropped without outcome")]);
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::with_fields("WORKER", &[("worker", "0")]);
        scope.complete_with_fields(&[("warehouses", "3")]);
    }

    #[test]
    fn test_scope_fail_and_abort() {
        ObservationScope::new("WORKER").fail("violation");
        ObservationScope::new("WORKER").abort("cancelled");
    }

    #[test]
    fn test_scope_drop_without_outcome() {
        let scope = ObservationScope::new("WORKER");
        drop(scope);
    }
}
