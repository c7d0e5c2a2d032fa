//! Sample Acquisition
//!
//! The cadence driver (periodic timer plus gesture interrupt) and the
//! task that turns each wake-up into a pooled sample or a logging
//! control token.

mod cadence;
mod error;
mod task;

pub use cadence::{Cadence, GestureLine, WakeCause, WakeSignal};
pub use error::AcquisitionError;
pub use task::AcquisitionTask;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where samples end up; chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggingMode {
    /// Human-readable block per sample on the live stream
    Streaming,
    /// CSV rows on the storage medium, toggled by double-tap
    FileLogging,
}

impl fmt::Display for LoggingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingMode::Streaming => write!(f, "streaming"),
            LoggingMode::FileLogging => write!(f, "file logging"),
        }
    }
}
