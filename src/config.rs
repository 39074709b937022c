//! Verification run configuration
//!
//! Loaded from a JSON file and validated before any worker starts.
//! Every field has a default so a missing file section never changes
//! behaviour silently:
//!
//! | Field | Default |
//! |---|---|
//! | `warehouses` | highest warehouse id in the dataset |
//! | `threads` | 1 |
//! | `float_tolerance` | 0.0 (exact) |
//! | `failure_policy` | `halt_on_first` |
//! | `dataset_path` | none |
//! | `log_level` | `info` |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::verify::{FailurePolicy, VerifyError, VerifyResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Warehouse count `W`; derived from the dataset when absent
    #[serde(default)]
    pub warehouses: Option<u32>,

    /// Worker count `T`
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Allowed magnitude of float deltas
    #[serde(default)]
    pub float_tolerance: f64,

    /// What to do after the first worker failure
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// JSON snapshot for the in-memory engine
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_threads() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            warehouses: None,
            threads: default_threads(),
            float_tolerance: 0.0,
            failure_policy: FailurePolicy::default(),
            dataset_path: None,
            log_level: default_log_level(),
        }
    }
}

impl CheckConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> VerifyResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VerifyError::config_invalid(format!("failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json_str(json: &str) -> VerifyResult<Self> {
        let config: CheckConfig = serde_json::from_str(json)
            .map_err(|e| VerifyError::config_invalid(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every field
    pub fn validate(&self) -> VerifyResult<()> {
        if self.threads == 0 {
            return Err(VerifyError::config_invalid("threads must be >= 1"));
        }
        if self.warehouses == Some(0) {
            return Err(VerifyError::config_invalid("warehouses must be >= 1"));
        }
        if !self.float_tolerance.is_finite() || self.float_tolerance < 0.0 {
            return Err(VerifyError::config_invalid(format!(
                "float_tolerance must be finite and >= 0, got {}",
                self.float_tolerance
            )));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> VerifyResult<Severity> {
        self.log_level.parse().map_err(VerifyError::config_invalid)
    }

    /// Warehouse count for the run: the configured value, else the
    /// dataset's.
    pub fn resolve_warehouses(&self, dataset_warehouses: u32) -> VerifyResult<u32> {
        match self.warehouses.unwrap_or(dataset_warehouses) {
            0 => Err(VerifyError::config_invalid(
                "warehouse count is 0: set `warehouses` or load a non-empty dataset",
            )),
            w => Ok(w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CheckConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CheckConfig::default());
        assert_eq!(config.threads, 1);
        assert_eq!(config.failure_policy, FailurePolicy::HaltOnFirst);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_full_config() {
        let config = CheckConfig::from_json_str(
            r#"{
                "warehouses": 10,
                "threads": 4,
                "float_tolerance": 0.000001,
                "failure_policy": "collect_all",
                "dataset_path": "./snapshot.json",
                "log_level": "warn"
            }"#,
        )
        .unwrap();
        assert_eq!(config.warehouses, Some(10));
        assert_eq!(config.threads, 4);
        assert_eq!(config.failure_policy, FailurePolicy::CollectAll);
        assert_eq!(config.dataset_path, Some(PathBuf::from("./snapshot.json")));
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = CheckConfig::from_json_str(r#"{"threads": 0}"#).unwrap_err();
        assert_eq!(err.code().code(), "TPCC_VERIFY_CONFIG_INVALID");
    }

    #[test]
    fn test_negative_threads_rejected() {
        assert!(CheckConfig::from_json_str(r#"{"threads": -2}"#).is_err());
    }

    #[test]
    fn test_zero_warehouses_rejected() {
        assert!(CheckConfig::from_json_str(r#"{"warehouses": 0}"#).is_err());
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        assert!(CheckConfig::from_json_str(r#"{"float_tolerance": -0.5}"#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(CheckConfig::from_json_str(r#"{"thread": 2}"#).is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(CheckConfig::from_json_str(r#"{"log_level": "loud"}"#).is_err());
    }

    #[test]
    fn test_resolve_warehouses() {
        let config = CheckConfig::default();
        assert_eq!(config.resolve_warehouses(7).unwrap(), 7);
        assert!(config.resolve_warehouses(0).is_err());

        let config = CheckConfig {
            warehouses: Some(3),
            ..CheckConfig::default()
        };
        assert_eq!(config.resolve_warehouses(7).unwrap(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"threads": 8}}"#).unwrap();
        let config = CheckConfig::load(file.path()).unwrap();
        assert_eq!(config.threads, 8);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CheckConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.message().contains("failed to read config"));
    }
}
