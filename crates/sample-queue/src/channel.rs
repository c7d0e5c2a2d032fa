//! Bounded Sample Channel

use crate::pool::SampleHandle;
use crate::QueueError;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Request carried in-band with the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToken {
    /// Start file logging if it is off, stop it if it is on
    ToggleLogging,
}

/// Item moving through the channel
#[derive(Debug)]
pub enum ChannelItem {
    Sample(SampleHandle),
    Control(ControlToken),
}

/// Create a channel holding at most `capacity` items
pub fn sample_channel(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (SampleProducer { tx }, SampleConsumer { rx })
}

/// Producer half
#[derive(Debug, Clone)]
pub struct SampleProducer {
    tx: mpsc::Sender<ChannelItem>,
}

impl SampleProducer {
    /// Enqueue without waiting; fails when the channel is full
    pub fn try_put(&self, item: ChannelItem) -> Result<(), QueueError> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full {
                capacity: self.capacity(),
            },
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Enqueue, waiting for a free slot
    pub async fn put(&self, item: ChannelItem) -> Result<(), QueueError> {
        self.tx.send(item).await.map_err(|_| QueueError::Closed)
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Consumer half
#[derive(Debug)]
pub struct SampleConsumer {
    rx: mpsc::Receiver<ChannelItem>,
}

impl SampleConsumer {
    /// Dequeue the oldest item, waiting until one arrives
    ///
    /// Returns `None` once every producer is gone and the channel is drained.
    pub async fn get(&mut self) -> Option<ChannelItem> {
        let item = self.rx.recv().await;
        if item.is_none() {
            debug!("Sample channel closed");
        }
        item
    }

    /// Dequeue without waiting
    pub fn try_get(&mut self) -> Option<ChannelItem> {
        self.rx.try_recv().ok()
    }
}
