//! Error types for configuration and service-control operations

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::service::Stage;

/// Failure while persisting the configuration file.
///
/// The read side has no error type: `ConfigStore::load` absorbs every read
/// failure and falls back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write configuration to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace configuration at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A rule operation addressed an index outside the current rule list.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("No proxy rule at index {index} ({len} rules configured)")]
pub struct RuleIndexError {
    pub index: usize,
    pub len: usize,
}

/// Failure of a service lifecycle operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Could not resolve the manager executable path: {0}")]
    Locate(#[source] std::io::Error),

    #[error("Service executable not found at {0}")]
    NotFound(PathBuf),

    #[error("Service {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },
}

impl ServiceError {
    /// The stage that failed, when the operation got as far as running one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ServiceError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Outcome of a single failed stage invocation.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to launch process: {0}")]
    Launch(#[from] std::io::Error),

    #[error("process exited with status code {0}")]
    Exit(i32),

    #[error("process terminated by a signal")]
    Signaled,

    #[error("process did not exit within {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_index_error_names_index_and_len() {
        let err = RuleIndexError { index: 5, len: 2 };
        assert_eq!(err.to_string(), "No proxy rule at index 5 (2 rules configured)");
    }

    #[test]
    fn service_error_reports_failed_stage() {
        let err = ServiceError::Stage {
            stage: Stage::Stop,
            source: StageError::Exit(1),
        };
        assert_eq!(err.stage(), Some(Stage::Stop));
        assert!(err.to_string().contains("stop"));
        assert!(err.to_string().contains("status code 1"));
    }

    #[test]
    fn not_found_has_no_stage() {
        let err = ServiceError::NotFound(PathBuf::from("/opt/appsocks-svc"));
        assert_eq!(err.stage(), None);
    }
}
