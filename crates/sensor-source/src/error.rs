//! Sensor Error Types

use thiserror::Error;

/// Errors reported by a sensor board collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// The transducer answered but reported a component failure
    #[error("Component failure on {0}")]
    ComponentFailure(&'static str),

    /// The transducer is not fitted on this board
    #[error("Sensor not present: {0}")]
    NotPresent(&'static str),

    /// Board queried before bring-up
    #[error("Sensor board not initialized")]
    NotInitialized,
}
