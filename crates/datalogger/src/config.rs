//! Datalog configuration

use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file, looked up in the working directory
pub const CONFIG_FILE: &str = "datalog.toml";

/// Runtime tunables. The logging mode is not among them: it is fixed
/// when the firmware is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatalogConfig {
    /// Sampling period (ms); 20 ms = 50 Hz
    pub period_ms: u64,

    /// Pool records and channel slots
    pub queue_capacity: usize,

    /// Directory standing in for the SD card
    pub log_dir: PathBuf,

    /// Delay between failed log file opens (ms)
    pub open_backoff_ms: u64,

    /// Delay between opening a log file and resuming sampling (ms)
    pub settle_ms: u64,

    /// tracing level filter
    pub log_level: String,
}

impl Default for DatalogConfig {
    fn default() -> Self {
        Self {
            period_ms: 20,
            queue_capacity: 100,
            log_dir: PathBuf::from("sd"),
            open_backoff_ms: 100,
            settle_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl DatalogConfig {
    /// Load from [`CONFIG_FILE`] (optional) and `DATALOG_*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load from `path` (optional) and `DATALOG_*` variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("DATALOG"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::Message("period_ms must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Message(
                "queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn open_backoff(&self) -> Duration {
        Duration::from_millis(self.open_backoff_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatalogConfig::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.period(), Duration::from_millis(20));
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalog.toml");
        std::fs::write(&path, "period_ms = 10\nlog_dir = \"card\"\n").unwrap();

        let config = DatalogConfig::load_from(&path).unwrap();

        assert_eq!(config.period_ms, 10);
        assert_eq!(config.log_dir, PathBuf::from("card"));
        assert_eq!(config.open_backoff(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalog.toml");
        std::fs::write(&path, "period_ms = 0\n").unwrap();

        let err = DatalogConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("period_ms"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalog.toml");
        std::fs::write(&path, "queue_capacity = 0\n").unwrap();

        let err = DatalogConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
        assert!(DatalogConfig::default().validate().is_ok());
    }
}
