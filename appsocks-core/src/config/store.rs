//! Loading and saving the configuration file

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::AppConfig;
use crate::error::ConfigError;

/// Default configuration file, resolved against the process working directory.
/// The routing service reads the same relative path.
pub const DEFAULT_CONFIG_FILE: &str = "app-config.json";

/// Reads and writes the configuration file at a fixed path.
///
/// Loading never fails outwardly: an absent or unreadable or malformed file
/// yields the default configuration, so first runs and corrupted files both
/// present the operator with a working empty state.
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, falling back to defaults on any read failure.
    ///
    /// A missing file is a normal first-run condition and logs nothing; any
    /// other read or parse failure is reported to the operator log only.
    pub fn load(&self) -> AppConfig {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return AppConfig::default(),
            Err(err) => {
                tracing::warn!("Could not read config file {}: {err}", self.path.display());
                return AppConfig::default();
            }
        };

        match serde_json::from_slice(&data) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Could not parse config file {}, starting from defaults: {err}",
                    self.path.display()
                );
                AppConfig::default()
            }
        }
    }

    /// Serialize `config` and replace the file contents in full.
    ///
    /// The document is written to a temporary file in the target directory
    /// and renamed over the destination, so a crash mid-write cannot leave a
    /// truncated configuration behind. Writers are serialized internally.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;

        let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tmp.write_all(json.as_bytes())
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        tmp.persist(&self.path).map_err(|err| ConfigError::Persist {
            path: self.path.clone(),
            source: err.error,
        })?;

        tracing::debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}
