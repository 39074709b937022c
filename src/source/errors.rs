//! Query interface errors
//!
//! Zero rows is never an error; these variants cover everything that
//! prevents a scan from producing trustworthy rows.

use thiserror::Error;

/// Result type for query interface operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors reported by an aggregate source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("scan cancelled")]
    Cancelled,

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {0}ms")]
    Timeout(u64),

    #[error("cannot open source: {0}")]
    Open(String),
}

impl SourceError {
    /// Whether the scan stopped because cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancelled() {
        assert!(SourceError::Cancelled.is_cancelled());
        assert!(!SourceError::Timeout(500).is_cancelled());
        assert_eq!(
            SourceError::Timeout(500).to_string(),
            "query timed out after 500ms"
        );
    }
}
