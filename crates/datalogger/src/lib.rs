//! SensorTile Datalog
//!
//! Wires the acquisition task, the sample pool and channel, and the sink
//! task into one pipeline owned by the process entry point.

mod config;

pub use crate::config::{DatalogConfig, CONFIG_FILE};

use acquisition::{
    AcquisitionError, AcquisitionTask, Cadence, GestureLine, LoggingMode, WakeSignal,
};
use datalog_sink::{FileLogger, LogMedium, Route, SinkTask, StreamSink, TraceIndicator};
use sample_queue::{sample_queue, SamplePool};
use sensor_source::{GestureClassifier, SampleSource, SensorBoard};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Logging mode selected when the firmware was built
pub const LOGGING_MODE: LoggingMode = if cfg!(feature = "file-logging") {
    LoggingMode::FileLogging
} else {
    LoggingMode::Streaming
};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Acquisition halted: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Sink collaborator for the chosen logging mode
pub enum Output<W, M> {
    Stream(W),
    File(M),
}

impl<W, M> Output<W, M> {
    pub fn mode(&self) -> LoggingMode {
        match self {
            Output::Stream(_) => LoggingMode::Streaming,
            Output::File(_) => LoggingMode::FileLogging,
        }
    }
}

/// Running pipeline; the only owner of the shared pipeline resources
pub struct Pipeline {
    mode: LoggingMode,
    pool: Arc<SamplePool>,
    cadence: Cadence,
    gesture: GestureLine,
    acquisition: JoinHandle<Result<(), AcquisitionError>>,
    sink: JoinHandle<()>,
}

impl Pipeline {
    /// Build the shared resources and spawn both tasks
    pub fn start<B, G, W, M>(
        config: &DatalogConfig,
        source: SampleSource<B>,
        classifier: G,
        output: Output<W, M>,
    ) -> Self
    where
        B: SensorBoard + 'static,
        G: GestureClassifier + 'static,
        W: StreamSink + 'static,
        M: LogMedium + 'static,
    {
        let mode = output.mode();
        info!(
            "Starting {} pipeline: period={}ms, capacity={}",
            mode, config.period_ms, config.queue_capacity
        );

        let (pool, producer, consumer) = sample_queue(config.queue_capacity);
        let wake = WakeSignal::new();
        let cadence = Cadence::new(config.period(), wake.clone());
        let gesture = GestureLine::new(wake);

        let route = match output {
            Output::Stream(sink) => Route::Stream(sink),
            Output::File(medium) => Route::File(
                FileLogger::new(medium, cadence.clone())
                    .with_backoff(config.open_backoff())
                    .with_settle(config.settle()),
            ),
        };
        let sink = SinkTask::new(route, pool.clone(), consumer)
            .with_indicator(TraceIndicator::default());
        let acquisition = AcquisitionTask::new(
            mode,
            source,
            classifier,
            pool.clone(),
            producer,
            cadence.clone(),
        );

        Self {
            mode,
            pool,
            cadence,
            gesture,
            acquisition: tokio::spawn(acquisition.run()),
            sink: tokio::spawn(sink.run()),
        }
    }

    pub fn mode(&self) -> LoggingMode {
        self.mode
    }

    pub fn pool(&self) -> &SamplePool {
        &self.pool
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Interrupt line for the gesture source
    pub fn gesture_line(&self) -> GestureLine {
        self.gesture.clone()
    }

    /// Wait for the acquisition task to stop; it only stops on a fatal error
    pub async fn join(self) -> Result<(), PipelineError> {
        let result = self.acquisition.await;
        self.cadence.stop();
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PipelineError::Acquisition(e)),
            Err(e) => Err(PipelineError::TaskFailed(e.to_string())),
        }
    }

    /// Stop both tasks and the cadence
    pub fn shutdown(self) {
        self.cadence.stop();
        self.acquisition.abort();
        self.sink.abort();
        info!("Pipeline shut down");
    }
}

/// Initialize logging on stderr, keeping stdout for the live stream
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Stop making progress for good
///
/// A headless board has nobody to report to, so fatal conditions end
/// here instead of in a restart.
pub async fn halt(reason: &dyn Display) {
    error!("Fatal: {}. Halting.", reason);
    loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
