//! Sample Source
//!
//! Queries every transducer for one reading. A failing channel is
//! zero-filled and reported, the rest of the record is still valid.

use crate::board::{EnvQuantity, Inventory, SensorBoard};
use crate::error::SensorError;
use crate::sample::{Axes, SensorSample};
use std::fmt;
use tokio::time::Instant;
use tracing::{debug, info};

/// One field group of [`SensorSample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Accel,
    Gyro,
    Mag,
    Pressure,
    Temperature,
    Humidity,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Accel => "accelerometer",
            Channel::Gyro => "gyroscope",
            Channel::Mag => "magnetometer",
            Channel::Pressure => "pressure",
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
        }
    }
}

/// Channels that failed during one [`SampleSource::read_all`]
///
/// Only the caller sees this; the record itself carries zeros for the
/// failed channels and no marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedRead {
    pub channels: Vec<Channel>,
}

impl fmt::Display for DegradedRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "degraded read on ")?;
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", channel.name())?;
        }
        Ok(())
    }
}

impl std::error::Error for DegradedRead {}

/// Reads a full [`SensorSample`] from a [`SensorBoard`]
pub struct SampleSource<B> {
    board: B,
    inventory: Inventory,
    /// Origin of the sample timestamps
    epoch: Instant,
}

impl<B: SensorBoard> SampleSource<B> {
    /// Bring up the board and start the sample clock
    pub fn new(mut board: B) -> Result<Self, SensorError> {
        let inventory = board.init()?;
        info!("Sample source ready: {:?}", inventory);
        Ok(Self {
            board,
            inventory,
            epoch: Instant::now(),
        })
    }

    /// Transducers found at bring-up
    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    /// Milliseconds since the source was created
    pub fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    /// Fill `sample` with one reading of every channel
    pub fn read_all(&mut self, sample: &mut SensorSample) -> Result<(), DegradedRead> {
        let mut failed = Vec::new();
        sample.timestamp_ms = self.now_ms();

        sample.acc = axes_or_zero(self.board.read_accel(), Channel::Accel, &mut failed);
        sample.gyro = axes_or_zero(self.board.read_gyro(), Channel::Gyro, &mut failed);
        sample.mag = axes_or_zero(self.board.read_mag(), Channel::Mag, &mut failed);

        sample.pressure = self.env_or_zero(EnvQuantity::Pressure, &mut failed);
        sample.temperature = self.env_or_zero(EnvQuantity::Temperature, &mut failed);
        sample.humidity = if self.inventory.humidity_sensor {
            self.env_or_zero(EnvQuantity::Humidity, &mut failed)
        } else {
            0.0
        };

        if failed.is_empty() {
            Ok(())
        } else {
            Err(DegradedRead { channels: failed })
        }
    }

    fn env_or_zero(&mut self, quantity: EnvQuantity, failed: &mut Vec<Channel>) -> f32 {
        match self.board.read_env(quantity) {
            Ok(value) => value,
            Err(e) => {
                debug!("{} read failed: {}", quantity.channel().name(), e);
                failed.push(quantity.channel());
                0.0
            }
        }
    }
}

fn axes_or_zero(
    reading: Result<Axes, SensorError>,
    channel: Channel,
    failed: &mut Vec<Channel>,
) -> Axes {
    match reading {
        Ok(axes) => axes,
        Err(e) => {
            debug!("{} read failed: {}", channel.name(), e);
            failed.push(channel);
            Axes::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SimulatedBoard;
    use std::time::Duration;

    #[tokio::test]
    async fn test_healthy_read() {
        let mut source = SampleSource::new(SimulatedBoard::new()).unwrap();
        let mut sample = SensorSample::default();

        assert!(source.read_all(&mut sample).is_ok());
        assert!(sample.pressure > 1000.0);
        assert!(sample.humidity > 0.0);
    }

    #[tokio::test]
    async fn test_failed_channels_are_zero_filled() {
        let board = SimulatedBoard::new()
            .failing(Channel::Mag)
            .failing(Channel::Pressure);
        let mut source = SampleSource::new(board).unwrap();
        let mut sample = SensorSample::default();

        let err = source.read_all(&mut sample).unwrap_err();
        assert_eq!(err.channels, vec![Channel::Mag, Channel::Pressure]);
        assert_eq!(err.to_string(), "degraded read on magnetometer, pressure");

        assert_eq!(sample.mag, Axes::ZERO);
        assert_eq!(sample.pressure, 0.0);
        // Healthy channels still carry data
        assert_ne!(sample.acc, Axes::ZERO);
        assert!(sample.temperature > 0.0);
    }

    #[tokio::test]
    async fn test_absent_humidity_is_not_degraded() {
        let board = SimulatedBoard::new().without_humidity_sensor();
        let mut source = SampleSource::new(board).unwrap();
        let mut sample = SensorSample::default();

        assert!(source.read_all(&mut sample).is_ok());
        assert_eq!(sample.humidity, 0.0);
        assert!(sample.temperature > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamp_follows_clock() {
        let mut source = SampleSource::new(SimulatedBoard::new()).unwrap();
        let mut sample = SensorSample::default();

        tokio::time::sleep(Duration::from_millis(20)).await;
        source.read_all(&mut sample).unwrap();
        assert_eq!(sample.timestamp_ms, 20);

        tokio::time::sleep(Duration::from_millis(20)).await;
        source.read_all(&mut sample).unwrap();
        assert_eq!(sample.timestamp_ms, 40);
    }
}
