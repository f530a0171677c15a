//! Driver configuration: TOML file, environment overrides, per-collection options.

use crate::errors::{DriverError, Result};
use crate::operation::{ReadPreference, WriteConcern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options every collection handle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    pub read_preference: ReadPreference,
    pub write_concern: WriteConcern,
    /// Initial batch size for new views; 0 lets the server decide.
    pub batch_size: i32,
}

impl CollectionOptions {
    #[must_use]
    pub const fn with_read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = read_preference;
        self
    }

    #[must_use]
    pub const fn with_write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = write_concern;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for rolling log files; current directory when unset.
    pub dir: Option<PathBuf>,
    /// error|warn|info|debug|trace
    pub level: String,
    pub retention: usize,
    /// Persist `dev6!` operation traces to their own file.
    pub dev_trace: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: None, level: "info".to_string(), retention: 7, dev_trace: false }
    }
}

/// Top-level driver configuration, typically loaded from `nexusdriver.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub database: String,
    pub read_preference: ReadPreference,
    pub write_concern: WriteConcern,
    pub batch_size: i32,
    pub log: LogConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            database: "test".to_string(),
            read_preference: ReadPreference::Primary,
            write_concern: WriteConcern::ACKNOWLEDGED,
            batch_size: 0,
            log: LogConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Applies overrides from the environment:
    /// - NEXUSDRIVER_DATABASE
    /// - NEXUSDRIVER_READ_PREFERENCE
    /// - NEXUSDRIVER_W
    /// - NEXUSDRIVER_JOURNAL
    /// - NEXUSDRIVER_BATCH_SIZE
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = var("NEXUSDRIVER_DATABASE") {
            self.database = db;
        }
        if let Some(rp) = var("NEXUSDRIVER_READ_PREFERENCE") {
            self.read_preference = rp.parse()?;
        }
        if let Some(w) = var("NEXUSDRIVER_W") {
            self.write_concern.w =
                w.parse().map_err(|_| DriverError::Config(format!("NEXUSDRIVER_W is not an integer: {w}")))?;
        }
        if let Some(j) = var("NEXUSDRIVER_JOURNAL") {
            self.write_concern.journal = matches!(j.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(n) = var("NEXUSDRIVER_BATCH_SIZE") {
            self.batch_size = n
                .parse()
                .map_err(|_| DriverError::Config(format!("NEXUSDRIVER_BATCH_SIZE is not an integer: {n}")))?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn collection_options(&self) -> CollectionOptions {
        CollectionOptions {
            read_preference: self.read_preference,
            write_concern: self.write_concern,
            batch_size: self.batch_size,
        }
    }
}
