//! Gesture Classifier

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Recognizes a double-tap from the motion sensor's event status
pub trait GestureClassifier: Send {
    /// Polled once per gesture interrupt
    fn is_double_tap(&mut self) -> bool;
}

/// Classifier backed by a shared latch
///
/// Whoever observes the physical gesture calls [`LatchedTap::latch`]; the
/// next poll consumes it, like reading the sensor's event status register.
#[derive(Debug, Clone, Default)]
pub struct LatchedTap {
    latched: Arc<AtomicBool>,
}

impl LatchedTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a double-tap happened
    pub fn latch(&self) {
        self.latched.store(true, Ordering::SeqCst);
    }
}

impl GestureClassifier for LatchedTap {
    fn is_double_tap(&mut self) -> bool {
        self.latched.swap(false, Ordering::SeqCst)
    }
}
