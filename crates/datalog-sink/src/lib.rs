//! Datalog Sink
//!
//! Drains the sample channel into the live stream or into CSV files on
//! the storage medium, and runs the file logging state machine.

mod file_logger;
mod format;
mod sink;
mod task;

pub use file_logger::{FileLogger, FileLoggingState};
pub use format::{csv_row, log_file_name, stream_block, CSV_HEADER};
pub use sink::{
    DirectoryMedium, LogMedium, MemoryMedium, MemoryStream, StatusIndicator, StdoutSink,
    StreamSink, TraceIndicator,
};
pub use task::{Route, SinkTask};

use thiserror::Error;

/// Sink errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Cannot create {name}: {reason}")]
    Create { name: String, reason: String },
    #[error("No log file open")]
    NotOpen,
    #[error("Write failed: {0}")]
    Write(String),
    #[error("Storage medium unavailable: {0}")]
    Medium(String),
}
