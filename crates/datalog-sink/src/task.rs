//! Sink Task

use crate::file_logger::FileLogger;
use crate::format::stream_block;
use crate::sink::{LogMedium, StatusIndicator, StreamSink};
use sample_queue::{ChannelItem, ControlToken, SampleConsumer, SampleHandle, SamplePool};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Output route, fixed for the life of the task
pub enum Route<W, M> {
    /// Labelled blocks on the live stream
    Stream(W),
    /// CSV rows into log files, toggled by control tokens
    File(FileLogger<M>),
}

/// Drains the sample channel into the active route
pub struct SinkTask<W, M> {
    route: Route<W, M>,
    pool: Arc<SamplePool>,
    consumer: SampleConsumer,
    indicator: Option<Box<dyn StatusIndicator>>,
    /// Samples handed to the route
    delivered: u64,
    /// Samples the route failed to store
    write_failures: u64,
}

impl<W: StreamSink, M: LogMedium> SinkTask<W, M> {
    pub fn new(route: Route<W, M>, pool: Arc<SamplePool>, consumer: SampleConsumer) -> Self {
        Self {
            route,
            pool,
            consumer,
            indicator: None,
            delivered: 0,
            write_failures: 0,
        }
    }

    /// Toggle `indicator` after every streamed sample
    pub fn with_indicator(mut self, indicator: impl StatusIndicator + 'static) -> Self {
        self.indicator = Some(Box::new(indicator));
        self
    }

    /// Run until the channel closes
    pub async fn run(mut self) {
        info!("Starting sink task");
        while let Some(item) = self.consumer.get().await {
            self.process(item).await;
        }
        info!(
            "Sink task stopped ({} delivered, {} write failures)",
            self.delivered, self.write_failures
        );
    }

    /// Handle one channel item
    pub async fn process(&mut self, item: ChannelItem) {
        match item {
            ChannelItem::Sample(handle) => self.deliver(handle),
            ChannelItem::Control(token) => self.control(token).await,
        }
    }

    pub fn route(&self) -> &Route<W, M> {
        &self.route
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    fn deliver(&mut self, handle: SampleHandle) {
        match &mut self.route {
            Route::Stream(sink) => {
                sink.write(stream_block(&handle).as_bytes());
                self.delivered += 1;
                if let Some(indicator) = self.indicator.as_mut() {
                    indicator.toggle();
                }
            }
            Route::File(logger) if logger.is_on() => match logger.write_sample(&handle) {
                Ok(()) => self.delivered += 1,
                Err(e) => {
                    self.write_failures += 1;
                    warn!("Sample at {} ms not logged: {}", handle.timestamp_ms, e);
                }
            },
            Route::File(_) => {
                debug!("Logging off, dropping sample at {} ms", handle.timestamp_ms);
            }
        }
        // Always, so a failed write never costs pool capacity
        self.pool.release(handle);
    }

    async fn control(&mut self, token: ControlToken) {
        match (&mut self.route, token) {
            (Route::File(logger), ControlToken::ToggleLogging) => logger.toggle().await,
            (Route::Stream(_), ControlToken::ToggleLogging) => {
                warn!("Logging toggle ignored on the live stream");
            }
        }
    }
}
