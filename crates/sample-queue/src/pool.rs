//! Preallocated Sample Pool

use sensor_source::SensorSample;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// Default pool capacity (2 s of samples at 50 Hz)
pub const DEFAULT_CAPACITY: usize = 100;

/// Source of [`SamplePool`] ids
static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// Writable slot handed out by [`SamplePool::acquire`]
#[derive(Debug)]
pub struct SampleSlot {
    pool_id: usize,
    index: usize,
    record: Box<SensorSample>,
}

impl SampleSlot {
    /// Index of the slot inside its pool
    pub fn index(&self) -> usize {
        self.index
    }

    /// Freeze the record; only read access remains
    pub fn seal(self) -> SampleHandle {
        SampleHandle { slot: self }
    }
}

impl Deref for SampleSlot {
    type Target = SensorSample;

    fn deref(&self) -> &SensorSample {
        &self.record
    }
}

impl DerefMut for SampleSlot {
    fn deref_mut(&mut self) -> &mut SensorSample {
        &mut self.record
    }
}

/// Read-only, exclusively owned pool record
///
/// Must be given back with [`SamplePool::release`]. Dropping it instead
/// leaks the slot for the rest of the process.
#[derive(Debug)]
pub struct SampleHandle {
    slot: SampleSlot,
}

impl SampleHandle {
    pub fn index(&self) -> usize {
        self.slot.index
    }
}

impl Deref for SampleHandle {
    type Target = SensorSample;

    fn deref(&self) -> &SensorSample {
        &self.slot.record
    }
}

/// Fixed set of sample records, never grown after construction
pub struct SamplePool {
    /// Tag carried by every slot of this pool
    id: usize,
    /// Records not currently handed out
    free: Mutex<Vec<SampleSlot>>,
    /// Number of records allocated at construction
    capacity: usize,
    /// Total successful acquisitions (for statistics)
    total_acquired: AtomicUsize,
}

impl SamplePool {
    /// Preallocate `capacity` records
    pub fn new(capacity: usize) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        // Reversed so the first acquire hands out slot 0
        let free: Vec<SampleSlot> = (0..capacity)
            .rev()
            .map(|index| SampleSlot {
                pool_id: id,
                index,
                record: Box::default(),
            })
            .collect();
        Self {
            id,
            free: Mutex::new(free),
            capacity,
            total_acquired: AtomicUsize::new(0),
        }
    }

    /// Create a pool with default capacity (100 records)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Take a zeroed record, or `None` when every record is outstanding
    pub fn acquire(&self) -> Option<SampleSlot> {
        let mut slot = self.lock_free().pop()?;
        slot.record.clear();
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
        Some(slot)
    }

    /// Return a record to the pool
    ///
    /// Handles acquired from another pool are discarded.
    pub fn release(&self, handle: SampleHandle) {
        if handle.slot.pool_id != self.id {
            warn!(
                "Slot {} does not belong to this pool, discarding",
                handle.index()
            );
            return;
        }
        self.lock_free().push(handle.slot);
    }

    /// Number of records currently handed out
    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }

    /// Number of records ready to be acquired
    pub fn available(&self) -> usize {
        self.lock_free().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total successful acquisitions since construction
    pub fn total_acquired(&self) -> usize {
        self.total_acquired.load(Ordering::Relaxed)
    }

    fn lock_free(&self) -> std::sync::MutexGuard<'_, Vec<SampleSlot>> {
        // Slot bookkeeping stays consistent even if a holder panicked
        self.free.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_acquire_until_exhausted() {
        let pool = SamplePool::new(3);

        let slots: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(slots[0].index(), 0);
        assert_eq!(pool.outstanding(), 3);
        assert!(pool.acquire().is_none());

        for slot in slots {
            pool.release(slot.seal());
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.total_acquired(), 3);
    }

    #[test]
    fn test_acquired_slot_is_zeroed() {
        let pool = SamplePool::new(1);

        let mut slot = pool.acquire().unwrap();
        slot.timestamp_ms = 1234;
        slot.pressure = 1000.0;
        pool.release(slot.seal());

        let slot = pool.acquire().unwrap();
        assert_eq!(*slot, SensorSample::default());
    }

    #[test]
    fn test_leaked_handle_shrinks_pool() {
        let pool = SamplePool::new(2);

        drop(pool.acquire().unwrap());
        assert_eq!(pool.available(), 1);
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_foreign_handle_does_not_grow_pool() {
        let pool = SamplePool::new(1);
        let other = SamplePool::new(1);

        pool.release(other.acquire().unwrap().seal());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_foreign_handle_rejected_while_slots_are_out() {
        let pool = SamplePool::new(2);
        let other = SamplePool::new(2);

        let own = pool.acquire().unwrap();
        assert_eq!(own.index(), 0);
        // Same index as the outstanding slot, must not end up in the free list
        pool.release(other.acquire().unwrap().seal());
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.outstanding(), 1);

        pool.release(own.seal());
        let indices: Vec<usize> = (0..2).map(|_| pool.acquire().unwrap().index()).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(pool.acquire().is_none());
    }

    proptest! {
        #[test]
        fn prop_outstanding_never_exceeds_capacity(
            capacity in 1usize..16,
            ops in prop::collection::vec(any::<bool>(), 0..200),
        ) {
            let pool = SamplePool::new(capacity);
            let mut held = Vec::new();

            for acquire in ops {
                if acquire {
                    match pool.acquire() {
                        Some(slot) => held.push(slot.seal()),
                        None => prop_assert_eq!(held.len(), capacity),
                    }
                } else if let Some(handle) = held.pop() {
                    pool.release(handle);
                }
                prop_assert!(pool.outstanding() <= capacity);
                prop_assert_eq!(pool.outstanding(), held.len());
            }
        }
    }
}
