//! Sensor Sample Acquisition
//!
//! This crate defines the sample record carried through the datalog
//! pipeline and the narrow capability interface the pipeline uses to
//! query the board's motion and environmental transducers.

mod board;
mod error;
mod gesture;
mod sample;
mod source;

pub use board::{EnvQuantity, Inventory, SensorBoard, SimulatedBoard};
pub use error::SensorError;
pub use gesture::{GestureClassifier, LatchedTap};
pub use sample::{Axes, SensorSample};
pub use source::{Channel, DegradedRead, SampleSource};
