//! File Logging State Machine
//!
//! Off --toggle--> Enabling --open ok--> On --toggle--> Off
//!
//! While Enabling, every failed open resets the medium and backs off
//! before the next attempt. There is no attempt limit.

use crate::format::{csv_row, log_file_name, CSV_HEADER};
use crate::sink::LogMedium;
use crate::SinkError;
use acquisition::Cadence;
use sensor_source::SensorSample;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default delay between failed open attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Default delay between a successful open and resuming the cadence
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLoggingState {
    Off,
    /// Retrying the open after `failed_attempts` failures
    Enabling { failed_attempts: u32 },
    On { file_name: String },
}

/// Owns the storage medium and the session counter
pub struct FileLogger<M> {
    medium: M,
    cadence: Cadence,
    state: FileLoggingState,
    /// Number used for the next log file name
    counter: u16,
    backoff: Duration,
    settle: Duration,
}

impl<M: LogMedium> FileLogger<M> {
    pub fn new(medium: M, cadence: Cadence) -> Self {
        Self {
            medium,
            cadence,
            state: FileLoggingState::Off,
            counter: 0,
            backoff: DEFAULT_BACKOFF,
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn state(&self) -> &FileLoggingState {
        &self.state
    }

    pub fn is_on(&self) -> bool {
        matches!(self.state, FileLoggingState::On { .. })
    }

    /// Number the next log file will get
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Handle a logging toggle request
    pub async fn toggle(&mut self) {
        if self.is_on() {
            self.disable();
        } else {
            self.enable().await;
        }
    }

    /// Open a new log file, retrying until the medium cooperates, then
    /// resume the cadence
    pub async fn enable(&mut self) {
        self.cadence.stop();

        while let Err(e) = self.attempt_open() {
            warn!("Log file open failed: {}, resetting medium", e);
            if let Err(e) = self.medium.reset_medium() {
                warn!("Medium reset failed: {}", e);
            }
            tokio::time::sleep(self.backoff).await;
        }

        tokio::time::sleep(self.settle).await;
        self.cadence.start();
    }

    /// One open attempt
    ///
    /// On failure the state is [`FileLoggingState::Enabling`]. The counter
    /// is given back when the file could not be created, but not when only
    /// the header write failed, since the file now exists.
    pub fn attempt_open(&mut self) -> Result<(), SinkError> {
        let failed_attempts = match self.state {
            FileLoggingState::Enabling { failed_attempts } => failed_attempts,
            _ => 0,
        };
        let name = log_file_name(self.counter);
        self.counter = self.counter.wrapping_add(1);

        if let Err(e) = self.medium.create(&name) {
            self.counter = self.counter.wrapping_sub(1);
            self.state = FileLoggingState::Enabling {
                failed_attempts: failed_attempts + 1,
            };
            return Err(e);
        }

        if let Err(e) = self.medium.write(CSV_HEADER.as_bytes()) {
            self.state = FileLoggingState::Enabling {
                failed_attempts: failed_attempts + 1,
            };
            return Err(e);
        }

        info!("Logging to {}", name);
        self.state = FileLoggingState::On { file_name: name };
        Ok(())
    }

    /// Close the open log file
    pub fn disable(&mut self) {
        self.cadence.stop();
        self.medium.close();
        if let FileLoggingState::On { file_name } = &self.state {
            info!("Closed {}", file_name);
        }
        self.state = FileLoggingState::Off;
    }

    /// Append one CSV row to the open log file
    pub fn write_sample(&mut self, sample: &SensorSample) -> Result<(), SinkError> {
        if !self.is_on() {
            return Err(SinkError::NotOpen);
        }
        let row = csv_row(sample);
        debug!("Writing {} bytes", row.len());
        self.medium.write(row.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryMedium;
    use acquisition::WakeSignal;
    use tokio::time::Instant;

    fn new_logger(medium: &MemoryMedium) -> (FileLogger<MemoryMedium>, Cadence) {
        let cadence = Cadence::new(Duration::from_millis(20), WakeSignal::new());
        (FileLogger::new(medium.clone(), cadence.clone()), cadence)
    }

    #[test]
    fn test_failed_opens_leave_counter_unchanged() {
        let medium = MemoryMedium::new();
        medium.fail_next_creates(5);
        let (mut logger, _cadence) = new_logger(&medium);

        for attempt in 1..=5 {
            assert!(logger.attempt_open().is_err());
            assert!(!logger.is_on());
            assert_eq!(logger.counter(), 0);
            assert_eq!(
                logger.state(),
                &FileLoggingState::Enabling {
                    failed_attempts: attempt
                }
            );
        }

        logger.attempt_open().unwrap();
        assert_eq!(
            logger.state(),
            &FileLoggingState::On {
                file_name: "SensorTile_Log_N000.csv".to_string()
            }
        );
        assert_eq!(logger.counter(), 1);
        assert!(medium
            .create_attempts()
            .iter()
            .all(|name| name == "SensorTile_Log_N000.csv"));
    }

    #[test]
    fn test_header_failure_consumes_name() {
        let medium = MemoryMedium::new();
        medium.fail_next_writes(1);
        let (mut logger, _cadence) = new_logger(&medium);

        assert!(logger.attempt_open().is_err());
        assert_eq!(logger.counter(), 1);

        logger.attempt_open().unwrap();
        assert_eq!(
            medium.create_attempts(),
            vec!["SensorTile_Log_N000.csv", "SensorTile_Log_N001.csv"]
        );
        assert_eq!(
            medium.file("SensorTile_Log_N001.csv").as_deref(),
            Some(CSV_HEADER)
        );
    }

    #[test]
    fn test_write_requires_open_file() {
        let medium = MemoryMedium::new();
        let (mut logger, _cadence) = new_logger(&medium);

        assert_eq!(
            logger.write_sample(&SensorSample::default()),
            Err(SinkError::NotOpen)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_retries_with_reset_and_backoff() {
        let medium = MemoryMedium::new();
        medium.fail_next_creates(3);
        let (mut logger, cadence) = new_logger(&medium);
        let start = Instant::now();

        logger.enable().await;

        assert!(logger.is_on());
        assert_eq!(logger.counter(), 1);
        assert_eq!(medium.resets(), 3);
        assert_eq!(medium.create_attempts().len(), 4);
        // Three backoffs plus the settle delay
        assert_eq!(start.elapsed(), DEFAULT_BACKOFF * 3 + DEFAULT_SETTLE);
        assert!(cadence.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_cycles_sessions() {
        let medium = MemoryMedium::new();
        let (mut logger, cadence) = new_logger(&medium);

        logger.toggle().await;
        logger
            .write_sample(&SensorSample {
                timestamp_ms: 20,
                ..Default::default()
            })
            .unwrap();
        logger.toggle().await;

        assert_eq!(logger.state(), &FileLoggingState::Off);
        assert!(!cadence.is_running());
        assert!(!medium.is_open());

        logger.toggle().await;
        assert_eq!(
            medium.file_names(),
            vec!["SensorTile_Log_N000.csv", "SensorTile_Log_N001.csv"]
        );
        let first = medium.file("SensorTile_Log_N000.csv").unwrap();
        assert!(first.starts_with(CSV_HEADER));
        assert!(first.ends_with("20, 0, 0, 0, 0, 0, 0, 0, 0, 0,  0.00,  0.00,  0.0\r\n"));
    }
}
