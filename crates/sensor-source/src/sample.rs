//! Sensor Sample Record

use serde::{Deserialize, Serialize};

/// Three-axis reading in the transducer's output unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Axes {
    pub const ZERO: Axes = Axes { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// One reading of every sensor on the board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Milliseconds since acquisition started (wraps after ~49 days)
    pub timestamp_ms: u32,
    /// Acceleration (mg)
    pub acc: Axes,
    /// Angular rate (mdps)
    pub gyro: Axes,
    /// Magnetic field (mgauss)
    pub mag: Axes,
    /// Pressure (hPa)
    pub pressure: f32,
    /// Temperature (°C)
    pub temperature: f32,
    /// Relative humidity (%)
    pub humidity: f32,
}

impl SensorSample {
    /// Reset every field to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
