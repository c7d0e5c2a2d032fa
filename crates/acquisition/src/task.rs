//! Acquisition Task

use crate::cadence::{Cadence, WakeCause, WakeSignal};
use crate::error::AcquisitionError;
use crate::LoggingMode;
use sample_queue::{ChannelItem, ControlToken, SamplePool, SampleProducer};
use sensor_source::{GestureClassifier, SampleSource, SensorBoard};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Waits on the wake signal and feeds the sample channel
pub struct AcquisitionTask<B, G> {
    mode: LoggingMode,
    source: SampleSource<B>,
    classifier: G,
    pool: Arc<SamplePool>,
    producer: SampleProducer,
    cadence: Cadence,
    wake: WakeSignal,
    /// Samples enqueued so far
    enqueued: u64,
}

impl<B: SensorBoard, G: GestureClassifier> AcquisitionTask<B, G> {
    pub fn new(
        mode: LoggingMode,
        source: SampleSource<B>,
        classifier: G,
        pool: Arc<SamplePool>,
        producer: SampleProducer,
        cadence: Cadence,
    ) -> Self {
        let wake = cadence.wake().clone();
        Self {
            mode,
            source,
            classifier,
            pool,
            producer,
            cadence,
            wake,
            enqueued: 0,
        }
    }

    /// Run until a fatal condition
    ///
    /// In streaming mode the cadence starts right away; in file logging
    /// mode it stays idle until the sink opens the first log file.
    pub async fn run(mut self) -> Result<(), AcquisitionError> {
        info!("Starting acquisition task ({})", self.mode);
        if self.mode == LoggingMode::Streaming {
            self.cadence.start();
        }

        loop {
            let cause = self.wake.wait().await;
            self.handle(cause).await?;
        }
    }

    /// Process one wake-up
    ///
    /// Gestures only mean something while file logging. In streaming mode
    /// the wake may also carry a coalesced tick, so it is sampled like one.
    pub async fn handle(&mut self, cause: WakeCause) -> Result<(), AcquisitionError> {
        match (cause, self.mode) {
            (WakeCause::Gesture, LoggingMode::FileLogging) => self.on_gesture().await,
            (WakeCause::Gesture, LoggingMode::Streaming) => {
                debug!("Gesture ignored in {} mode", self.mode);
                self.on_tick()
            }
            (WakeCause::Tick, _) => self.on_tick(),
        }
    }

    /// Samples enqueued since start
    pub fn enqueued(&self) -> u64 {
        self.enqueued
    }

    fn on_tick(&mut self) -> Result<(), AcquisitionError> {
        let mut slot = self.pool.acquire().ok_or(AcquisitionError::PoolExhausted {
            capacity: self.pool.capacity(),
        })?;

        if let Err(degraded) = self.source.read_all(&mut slot) {
            warn!("Sample at {} ms: {}", slot.timestamp_ms, degraded);
        }

        self.producer.try_put(ChannelItem::Sample(slot.seal()))?;
        self.enqueued += 1;
        Ok(())
    }

    async fn on_gesture(&mut self) -> Result<(), AcquisitionError> {
        if !self.classifier.is_double_tap() {
            debug!("Gesture was not a double-tap");
            return Ok(());
        }

        info!("Double-tap detected, requesting logging toggle");
        // No sample may be captured while the sink swaps the log file
        self.cadence.stop();
        self.producer
            .put(ChannelItem::Control(ControlToken::ToggleLogging))
            .await?;
        Ok(())
    }
}
