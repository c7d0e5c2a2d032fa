//! Acquisition Error Types

use sample_queue::QueueError;
use thiserror::Error;

/// Fatal conditions of the acquisition task
///
/// None of these are recoverable; the caller is expected to halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// Every pool record is outstanding
    #[error("Sample pool exhausted ({capacity} records outstanding)")]
    PoolExhausted { capacity: usize },

    /// Channel had no room for a fresh sample
    #[error("Sample channel full ({capacity} items)")]
    ChannelFull { capacity: usize },

    /// Sink side is gone
    #[error("Sample channel closed")]
    ChannelClosed,
}

impl From<QueueError> for AcquisitionError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full { capacity } => AcquisitionError::ChannelFull { capacity },
            QueueError::Closed => AcquisitionError::ChannelClosed,
        }
    }
}
