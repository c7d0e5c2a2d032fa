//! Sensor Board Capability Interface
//!
//! The register-level drivers live outside this crate; the pipeline only
//! sees one capability per physical quantity.

use crate::error::SensorError;
use crate::sample::Axes;
use crate::source::Channel;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use tracing::{debug, info};

/// Environmental quantity read through [`SensorBoard::read_env`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvQuantity {
    Pressure,
    Temperature,
    Humidity,
}

impl EnvQuantity {
    pub fn channel(self) -> Channel {
        match self {
            EnvQuantity::Pressure => Channel::Pressure,
            EnvQuantity::Temperature => Channel::Temperature,
            EnvQuantity::Humidity => Channel::Humidity,
        }
    }
}

/// Transducers found during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    /// Humidity sensor answered at init. When it is missing, temperature
    /// is taken from the pressure sensor instead.
    pub humidity_sensor: bool,
}

/// Capability interface implemented once per concrete board
pub trait SensorBoard: Send {
    /// Bring up every transducer and report which ones are fitted
    fn init(&mut self) -> Result<Inventory, SensorError>;

    /// Acceleration in mg
    fn read_accel(&mut self) -> Result<Axes, SensorError>;

    /// Angular rate in mdps
    fn read_gyro(&mut self) -> Result<Axes, SensorError>;

    /// Magnetic field in mgauss
    fn read_mag(&mut self) -> Result<Axes, SensorError>;

    /// Pressure (hPa), temperature (°C) or humidity (%RH)
    fn read_env(&mut self, quantity: EnvQuantity) -> Result<f32, SensorError>;
}

/// Host stand-in for the SensorTile transducers
///
/// Produces deterministic, slowly varying readings so that logs are
/// plausible, and can be told to fail individual channels.
pub struct SimulatedBoard {
    initialized: bool,
    humidity_fitted: bool,
    failing: HashSet<Channel>,
    /// Sample index, advanced on every accelerometer read
    step: u64,
}

impl SimulatedBoard {
    /// Create a board with every transducer fitted and healthy
    pub fn new() -> Self {
        Self {
            initialized: false,
            humidity_fitted: true,
            failing: HashSet::new(),
            step: 0,
        }
    }

    /// Board variant without the humidity sensor
    pub fn without_humidity_sensor(mut self) -> Self {
        self.humidity_fitted = false;
        self
    }

    /// Make every read of `channel` report a component failure
    pub fn failing(mut self, channel: Channel) -> Self {
        self.failing.insert(channel);
        self
    }

    fn check(&self, channel: Channel) -> Result<(), SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized);
        }
        if self.failing.contains(&channel) {
            debug!("Injected failure on {}", channel.name());
            return Err(SensorError::ComponentFailure(channel.name()));
        }
        Ok(())
    }

    /// Small pseudo-random offset in `[-span, span]`
    fn jitter(&self, channel: Channel, span: i32) -> i32 {
        let mut hasher = DefaultHasher::new();
        self.step.hash(&mut hasher);
        channel.hash(&mut hasher);
        let hash = hasher.finish();
        (hash % (2 * span as u64 + 1)) as i32 - span
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBoard for SimulatedBoard {
    fn init(&mut self) -> Result<Inventory, SensorError> {
        self.initialized = true;
        info!(
            "Simulated sensor board initialized (humidity sensor: {})",
            if self.humidity_fitted { "present" } else { "absent" }
        );
        Ok(Inventory {
            humidity_sensor: self.humidity_fitted,
        })
    }

    fn read_accel(&mut self) -> Result<Axes, SensorError> {
        self.step += 1;
        self.check(Channel::Accel)?;
        // Board lying flat: 1 g on Z
        Ok(Axes::new(
            self.jitter(Channel::Accel, 20),
            self.jitter(Channel::Accel, 20),
            1000 + self.jitter(Channel::Accel, 15),
        ))
    }

    fn read_gyro(&mut self) -> Result<Axes, SensorError> {
        self.check(Channel::Gyro)?;
        Ok(Axes::new(
            self.jitter(Channel::Gyro, 700),
            self.jitter(Channel::Gyro, 700),
            self.jitter(Channel::Gyro, 700),
        ))
    }

    fn read_mag(&mut self) -> Result<Axes, SensorError> {
        self.check(Channel::Mag)?;
        Ok(Axes::new(
            220 + self.jitter(Channel::Mag, 5),
            -45 + self.jitter(Channel::Mag, 5),
            410 + self.jitter(Channel::Mag, 5),
        ))
    }

    fn read_env(&mut self, quantity: EnvQuantity) -> Result<f32, SensorError> {
        let channel = quantity.channel();
        self.check(channel)?;
        let noise = self.jitter(channel, 10) as f32 / 100.0;
        match quantity {
            EnvQuantity::Pressure => Ok(1013.25 + noise),
            // Without the humidity sensor the pressure die reports temperature
            EnvQuantity::Temperature if !self.humidity_fitted => Ok(25.10 + noise),
            EnvQuantity::Temperature => Ok(24.50 + noise),
            EnvQuantity::Humidity if !self.humidity_fitted => {
                Err(SensorError::NotPresent("humidity"))
            }
            EnvQuantity::Humidity => Ok(45.0 + noise * 10.0),
        }
    }
}
