//! Cadence Driver
//!
//! Two interrupt-like sources share one binary wake signal: a periodic
//! ticker and the gesture line. Neither does any work beyond releasing
//! the signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// Why the acquisition task woke up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    Tick,
    Gesture,
}

#[derive(Debug, Default)]
struct WakeInner {
    /// Holds at most one pending permit
    notify: Notify,
    gesture_pending: AtomicBool,
}

/// Binary wake signal consumed by the acquisition task
#[derive(Debug, Clone, Default)]
pub struct WakeSignal {
    inner: Arc<WakeInner>,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timer context: release the signal. Never blocks.
    pub fn release(&self) {
        self.inner.notify.notify_one();
    }

    /// Gesture context: flag the edge and release the signal. Never blocks.
    pub fn raise_gesture(&self) {
        self.inner.gesture_pending.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    /// Wait for the next release
    ///
    /// A pending gesture edge takes precedence and is cleared here.
    pub async fn wait(&self) -> WakeCause {
        self.inner.notify.notified().await;
        if self.inner.gesture_pending.swap(false, Ordering::SeqCst) {
            WakeCause::Gesture
        } else {
            WakeCause::Tick
        }
    }
}

/// Edge-triggered gesture interrupt line
#[derive(Debug, Clone)]
pub struct GestureLine {
    wake: WakeSignal,
}

impl GestureLine {
    pub fn new(wake: WakeSignal) -> Self {
        Self { wake }
    }

    /// Rising edge on the motion sensor's interrupt pin
    pub fn raise(&self) {
        debug!("Gesture interrupt");
        self.wake.raise_gesture();
    }
}

/// Periodic sampling timer that can be paused and resumed
#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    wake: WakeSignal,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Cadence {
    pub fn new(period: Duration, wake: WakeSignal) -> Self {
        Self {
            period,
            wake,
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Signal released by this cadence
    pub fn wake(&self) -> &WakeSignal {
        &self.wake
    }

    /// Start ticking; the first tick comes one period from now.
    /// No-op if already running. Must be called inside a tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.lock_ticker();
        if ticker.is_some() {
            return;
        }

        let period = self.period;
        let wake = self.wake.clone();
        *ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                wake.release();
            }
        }));
        info!("Cadence started ({} ms)", period.as_millis());
    }

    /// Stop ticking. No-op if already stopped.
    pub fn stop(&self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
            info!("Cadence stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_ticker().is_some()
    }

    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_wake_is_binary() {
        let wake = WakeSignal::new();
        wake.release();
        wake.release();

        assert_eq!(wake.wait().await, WakeCause::Tick);
        // Second release coalesced with the first
        let pending = timeout(Duration::from_millis(10), wake.wait()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_gesture_takes_precedence() {
        let wake = WakeSignal::new();
        let line = GestureLine::new(wake.clone());

        wake.release();
        line.raise();

        assert_eq!(wake.wait().await, WakeCause::Gesture);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cadence_ticks_once_per_period() {
        let wake = WakeSignal::new();
        let cadence = Cadence::new(Duration::from_millis(20), wake.clone());
        let start = Instant::now();

        cadence.start();
        cadence.start();
        assert!(cadence.is_running());

        for n in 1..=3u32 {
            assert_eq!(wake.wait().await, WakeCause::Tick);
            assert_eq!(start.elapsed(), Duration::from_millis(20) * n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_cadence_is_silent() {
        let wake = WakeSignal::new();
        let cadence = Cadence::new(Duration::from_millis(20), wake.clone());

        cadence.start();
        cadence.stop();
        cadence.stop();
        assert!(!cadence.is_running());

        let woke = timeout(Duration::from_millis(100), wake.wait()).await;
        assert!(woke.is_err());
    }
}
