use std::collections::VecDeque;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::Error;

/// Source of record regions for writers, and of finished records for the
/// consumer.
///
/// A provider owns allocation and ordering. Writers acquire a region, fill it,
/// and publish it; nothing is visible to the read side before `publish`. The
/// consumer takes regions in publish order and releases each one once it is
/// decoded, so the provider can reuse the memory.
///
/// Whether acquisition blocks, fails, or drops under saturation is the
/// provider's policy. Writers surface whatever the provider reports.
///
/// # Examples
///
/// ```
/// # use deferred_log::{BufferProvider, RecordQueue};
/// let queue = RecordQueue::<1024>::new();
///
/// let mut region = queue.acquire_write_region(4).unwrap();
/// region.copy_from_slice(b"data");
/// queue.publish(region);
///
/// let region = queue.next_read_region().unwrap();
/// assert_eq!(&region[..], b"data");
/// queue.release(region);
/// assert!(queue.next_read_region().is_none());
/// ```
pub trait BufferProvider {
    /// A contiguous byte region, exclusively owned by whoever holds it.
    type Region: DerefMut<Target = [u8]>;

    /// Hands out a writable region of exactly `byte_count` bytes.
    fn acquire_write_region(&self, byte_count: usize) -> Result<Self::Region, Error>;

    /// Makes a fully written region visible to the read side.
    fn publish(&self, region: Self::Region);

    /// Takes the next published region in writer order, if any.
    fn next_read_region(&self) -> Option<Self::Region>;

    /// Returns a consumed region to the provider.
    ///
    /// Providers may also reclaim a region that is dropped without being
    /// released; [`RecordQueue`] does.
    fn release(&self, region: Self::Region);
}

impl<P: BufferProvider + ?Sized> BufferProvider for &P {
    type Region = P::Region;

    fn acquire_write_region(&self, byte_count: usize) -> Result<Self::Region, Error> {
        P::acquire_write_region(self, byte_count)
    }

    fn publish(&self, region: Self::Region) {
        P::publish(self, region)
    }

    fn next_read_region(&self) -> Option<Self::Region> {
        P::next_read_region(self)
    }

    fn release(&self, region: Self::Region) {
        P::release(self, region)
    }
}

impl<P: BufferProvider + ?Sized> BufferProvider for Arc<P> {
    type Region = P::Region;

    fn acquire_write_region(&self, byte_count: usize) -> Result<Self::Region, Error> {
        P::acquire_write_region(self, byte_count)
    }

    fn publish(&self, region: Self::Region) {
        P::publish(self, region)
    }

    fn next_read_region(&self) -> Option<Self::Region> {
        P::next_read_region(self)
    }

    fn release(&self, region: Self::Region) {
        P::release(self, region)
    }
}

/// Byte region handed out by [`RecordQueue`].
///
/// A region belongs to the queue that issued it. Dropping it, published or
/// not, returns its bytes to that queue's budget; `release` is the same as a
/// drop.
#[derive(Debug)]
pub struct Region {
    bytes: Vec<u8>,
    home: Weak<Mutex<QueueState>>,
}

impl Drop for Region {
    fn drop(&mut self) {
        // The queue is gone; nothing to give back
        let Some(home) = self.home.upgrade() else {
            return;
        };
        let bytes = mem::take(&mut self.bytes);
        home.lock().give_back(bytes);
    }
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for Region {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Upper bound on recycled allocations kept around for reuse.
const POOL_LIMIT: usize = 64;

/// A bounded, in-memory FIFO of records.
///
/// `RecordQueue` is the reference [`BufferProvider`]. Every acquired region
/// reserves its size out of a budget of `CAP` bytes until the consumer
/// releases it; a request that does not fit fails with [`Error::Saturated`]
/// immediately. There is no blocking and no retry.
///
/// Released allocations are pooled, so a steady-state writer does not hit the
/// allocator. A region that is dropped instead of released (an abandoned
/// write, a consumer that unwinds) still returns its reservation.
///
/// # Thread Safety
///
/// The queue is `Sync`: any number of writers may share it with one consumer.
/// Acquisition and publication serialize on an internal lock, and the
/// cross-writer order is publish order.
///
/// # Type Parameters
///
/// * `CAP` - Byte budget shared by all outstanding regions
pub struct RecordQueue<const CAP: usize> {
    state: Arc<Mutex<QueueState>>,
}

#[derive(Debug)]
struct QueueState {
    ready: VecDeque<Region>,
    pool: Vec<Vec<u8>>,
    reserved: usize,
}

impl QueueState {
    fn give_back(&mut self, bytes: Vec<u8>) {
        debug_assert!(
            bytes.len() <= self.reserved,
            "region of {} bytes returned with only {} reserved",
            bytes.len(),
            self.reserved
        );
        self.reserved = self.reserved.saturating_sub(bytes.len());
        if self.pool.len() < POOL_LIMIT {
            self.pool.push(bytes);
        }
    }
}

impl<const CAP: usize> RecordQueue<CAP> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                ready: VecDeque::new(),
                pool: Vec::new(),
                reserved: 0,
            })),
        }
    }

    /// Number of published records waiting to be consumed.
    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held by acquired or unconsumed regions.
    pub fn reserved_bytes(&self) -> usize {
        self.state.lock().reserved
    }

    /// Total byte budget.
    pub const fn capacity(&self) -> usize {
        CAP
    }
}

impl<const CAP: usize> Default for RecordQueue<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> BufferProvider for RecordQueue<CAP> {
    type Region = Region;

    fn acquire_write_region(&self, byte_count: usize) -> Result<Region, Error> {
        let recycled = {
            let mut state = self.state.lock();
            let available = CAP - state.reserved;
            if byte_count > available {
                drop(state);
                warn!(requested = byte_count, available, capacity = CAP, "record queue saturated");
                return Err(Error::Saturated {
                    requested: byte_count,
                    available,
                });
            }
            state.reserved += byte_count;
            state.pool.pop()
        };

        let mut bytes = recycled.unwrap_or_default();
        bytes.clear();
        bytes.resize(byte_count, 0);
        Ok(Region {
            bytes,
            home: Arc::downgrade(&self.state),
        })
    }

    fn publish(&self, region: Region) {
        self.state.lock().ready.push_back(region);
    }

    fn next_read_region(&self) -> Option<Region> {
        self.state.lock().ready.pop_front()
    }

    fn release(&self, region: Region) {
        // Must not run under `self.state`: the drop takes the issuing queue's lock
        drop(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = RecordQueue::<64>::new();
        for i in 0..3u8 {
            let mut region = queue.acquire_write_region(1).unwrap();
            region[0] = i;
            queue.publish(region);
        }

        assert_eq!(queue.len(), 3);
        for i in 0..3u8 {
            let region = queue.next_read_region().unwrap();
            assert_eq!(region[0], i);
            queue.release(region);
        }
        assert!(queue.is_empty());
        assert_eq!(queue.reserved_bytes(), 0);
    }

    #[test]
    fn test_saturation() {
        let queue = RecordQueue::<16>::new();
        let first = queue.acquire_write_region(10).unwrap();

        match queue.acquire_write_region(7) {
            Err(Error::Saturated { requested, available }) => {
                assert_eq!(requested, 7);
                assert_eq!(available, 6);
            }
            other => panic!("expected saturation, got {:?}", other),
        }

        queue.publish(first);
        let region = queue.next_read_region().unwrap();
        queue.release(region);
        assert!(queue.acquire_write_region(16).is_ok());
    }

    #[test]
    fn test_recycled_region_is_zeroed_and_sized() {
        let queue = RecordQueue::<64>::new();
        let mut region = queue.acquire_write_region(8).unwrap();
        region.fill(0xff);
        queue.publish(region);
        let region = queue.next_read_region().unwrap();
        queue.release(region);

        let region = queue.acquire_write_region(4).unwrap();
        assert_eq!(&region[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_unpublished_region_is_invisible() {
        let queue = RecordQueue::<64>::new();
        let _region = queue.acquire_write_region(8).unwrap();
        assert!(queue.next_read_region().is_none());
        assert_eq!(queue.reserved_bytes(), 8);
    }

    #[test]
    fn test_dropped_region_returns_budget() {
        let queue = RecordQueue::<16>::new();
        let abandoned = queue.acquire_write_region(12).unwrap();
        assert_eq!(queue.reserved_bytes(), 12);
        drop(abandoned);
        assert_eq!(queue.reserved_bytes(), 0);

        let region = queue.acquire_write_region(16).unwrap();
        queue.publish(region);
        drop(queue.next_read_region());
        assert_eq!(queue.reserved_bytes(), 0);
        assert!(queue.acquire_write_region(16).is_ok());
    }

    #[test]
    fn test_region_returns_to_issuing_queue() {
        let issuer = RecordQueue::<32>::new();
        let other = RecordQueue::<32>::new();
        let held = other.acquire_write_region(4).unwrap();

        let region = issuer.acquire_write_region(20).unwrap();
        other.release(region);

        assert_eq!(issuer.reserved_bytes(), 0);
        assert_eq!(other.reserved_bytes(), 4);
        drop(held);
        assert_eq!(other.reserved_bytes(), 0);
    }

    #[test]
    fn test_region_outlives_queue() {
        let region = {
            let queue = RecordQueue::<32>::new();
            queue.acquire_write_region(8).unwrap()
        };
        assert_eq!(region.len(), 8);
        drop(region);
    }

    #[test]
    fn test_dropping_queue_with_pending_records() {
        let queue = RecordQueue::<32>::new();
        for _ in 0..3 {
            let region = queue.acquire_write_region(4).unwrap();
            queue.publish(region);
        }
        assert_eq!(queue.len(), 3);
        drop(queue);
    }
}
