//! Sample Pool and Channel
//!
//! Fixed-capacity storage for sensor samples plus the bounded FIFO that
//! moves ownership of those samples from the acquisition task to the
//! sink task.

mod channel;
mod pool;

pub use channel::{sample_channel, ChannelItem, ControlToken, SampleConsumer, SampleProducer};
pub use pool::{SampleHandle, SamplePool, SampleSlot, DEFAULT_CAPACITY};

use std::sync::Arc;
use thiserror::Error;

/// Queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Sample channel full ({capacity} items)")]
    Full { capacity: usize },
    #[error("Sample channel closed")]
    Closed,
}

/// Build a pool and a channel of the same capacity
///
/// With equal capacities the producer can never hold more samples than
/// the channel has slots.
pub fn sample_queue(capacity: usize) -> (Arc<SamplePool>, SampleProducer, SampleConsumer) {
    let pool = Arc::new(SamplePool::new(capacity));
    let (producer, consumer) = sample_channel(capacity);
    (pool, producer, consumer)
}
