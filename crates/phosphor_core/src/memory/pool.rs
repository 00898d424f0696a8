//! # Buffer Pool
//!
//! Registry of arena buffers, partitioned into per-tag used lists and one
//! free list. Satisfies requests by recycling the first sufficiently large
//! free buffer, growing with page-aligned blocks only when nothing fits.
//!
//! The lock is intentionally coarse: pool traffic is once per simulation
//! tick, not per draw call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::buffer::{Buffer, BufferTag};

/// Granularity of fresh buffer allocations, in bytes.
///
/// New blocks are sized to the next multiple of this, standing in for the
/// system page size of the mmap-backed original.
pub const PAGE_SIZE: usize = 4096;

/// Extra headroom added to every sizing request.
///
/// Covers alignment padding inside the arena so that a request for exactly
/// `n` payload bytes never fails on its first carve.
pub const BUFFER_SLACK: usize = 64;

/// Lists guarded by the pool mutex.
///
/// Invariant: a buffer is in exactly one of {checked out, used-by-tag,
/// free} at any time.
struct PoolInner {
    /// Frozen buffers currently backing a live slot, partitioned by tag.
    used: [Vec<Arc<Buffer>>; BufferTag::COUNT],
    /// Recyclable buffers, scanned first-fit by capacity.
    free: Vec<Buffer>,
    /// Total bytes obtained from the OS allocator.
    allocated_bytes: usize,
}

/// A pool of tagged arena buffers.
///
/// Explicitly constructed and shared by `Arc` - one per renderer in
/// production, as many as needed in tests. Buffers are returned to the OS
/// only when the pool is dropped.
pub struct BufferPool {
    inner: Mutex<PoolInner>,
    next_id: AtomicU64,
}

impl BufferPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                used: [Vec::new(), Vec::new(), Vec::new()],
                free: Vec::new(),
                allocated_bytes: 0,
            }),
            next_id: AtomicU64::new(0),
        }
    }

    /// Checks out a buffer big enough for `size` payload bytes, tagged
    /// `(tag, slot)`.
    ///
    /// The first free buffer whose capacity strictly exceeds
    /// `size + BUFFER_SLACK` is reset, re-tagged, and returned. If none
    /// fits, a fresh block rounded up to a [`PAGE_SIZE`] multiple is
    /// allocated. OS allocation failure aborts the process; there is no
    /// degraded mode for "no memory for frame data".
    ///
    /// The returned buffer is exclusively owned until it is frozen and
    /// given back via [`BufferPool::retire`].
    #[must_use]
    pub fn get_buffer(&self, tag: BufferTag, slot: u32, size: usize) -> Buffer {
        let needed = size + BUFFER_SLACK;
        let mut inner = self.inner.lock();

        if let Some(pos) = inner.free.iter().position(|b| b.capacity() > needed) {
            let mut buffer = inner.free.remove(pos);
            buffer.reset();
            buffer.retag(tag, slot);
            return buffer;
        }

        let capacity = needed.div_ceil(PAGE_SIZE) * PAGE_SIZE;
        inner.allocated_bytes += capacity;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(capacity, ?tag, slot, id, "pool growth: fresh page-aligned buffer");
        Buffer::new(capacity, tag, slot, id)
    }

    /// Files a frozen buffer under its tag's used list.
    pub fn retire(&self, buffer: Arc<Buffer>) {
        let mut inner = self.inner.lock();
        inner.used[buffer.tag().index()].push(buffer);
    }

    /// Returns a checked-out buffer straight to the free list.
    ///
    /// Used when packet construction is abandoned before freezing.
    pub fn recycle(&self, mut buffer: Buffer) {
        buffer.reset();
        self.inner.lock().free.push(buffer);
    }

    /// Reclaims every used buffer matching `(tag, slot)`, moving it to the
    /// free list. Returns the number reclaimed.
    ///
    /// A matching buffer that is still referenced outside the pool is a
    /// protocol violation - the exchange guarantees the render thread has
    /// released the slot before it is reclaimed. Such buffers are logged
    /// and left in the used list rather than recycled out from under a
    /// reader.
    pub fn free_slot(&self, tag: BufferTag, slot: u32) -> usize {
        let mut inner = self.inner.lock();
        let list = std::mem::take(&mut inner.used[tag.index()]);
        let mut reclaimed = 0;

        for entry in list {
            if entry.slot() != slot {
                inner.used[tag.index()].push(entry);
                continue;
            }
            match Arc::try_unwrap(entry) {
                Ok(mut buffer) => {
                    buffer.reset();
                    inner.free.push(buffer);
                    reclaimed += 1;
                }
                Err(entry) => {
                    warn!(
                        ?tag,
                        slot,
                        id = entry.id(),
                        "buffer still referenced at reclaim; leaving in used list"
                    );
                    inner.used[tag.index()].push(entry);
                }
            }
        }
        reclaimed
    }

    /// Number of buffers in the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.inner.lock().free.len()
    }

    /// Number of used buffers filed under `tag`.
    #[must_use]
    pub fn used_count(&self, tag: BufferTag) -> usize {
        self.inner.lock().used[tag.index()].len()
    }

    /// Total bytes obtained from the OS allocator over the pool's lifetime.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.inner.lock().allocated_bytes
    }

    /// Seeds the free list with a pre-built buffer (tests only).
    #[cfg(test)]
    fn seed_free(&self, buffer: Buffer) {
        self.inner.lock().free.push(buffer);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffers_are_page_multiples() {
        let pool = BufferPool::new();
        let buf = pool.get_buffer(BufferTag::Primary, 0, 100);
        assert_eq!(buf.capacity() % PAGE_SIZE, 0);
        assert!(buf.capacity() > 100 + BUFFER_SLACK);
        assert_eq!(pool.allocated_bytes(), buf.capacity());
    }

    #[test]
    fn first_fit_picks_first_sufficient_buffer() {
        let pool = BufferPool::new();
        pool.seed_free(Buffer::new(100, BufferTag::Primary, 0, 100));
        pool.seed_free(Buffer::new(500, BufferTag::Primary, 0, 101));
        pool.seed_free(Buffer::new(1000, BufferTag::Primary, 0, 102));

        // 300 + slack does not fit in 100, fits in 500; the 1000-byte
        // buffer must not be touched.
        let buf = pool.get_buffer(BufferTag::Primary, 0, 300);
        assert_eq!(buf.id(), 101);
        assert_eq!(pool.free_count(), 2);
    }

    #[test]
    fn slot_reclamation_returns_the_identical_buffer() {
        let pool = BufferPool::new();

        let buf = pool.get_buffer(BufferTag::Primary, 0, 256);
        let original_id = buf.id();
        pool.retire(Arc::new(buf));
        assert_eq!(pool.used_count(BufferTag::Primary), 1);

        assert_eq!(pool.free_slot(BufferTag::Primary, 0), 1);
        assert_eq!(pool.used_count(BufferTag::Primary), 0);
        assert_eq!(pool.free_count(), 1);

        // Identity-equal reuse before any other allocation intervenes.
        let again = pool.get_buffer(BufferTag::Primary, 0, 256);
        assert_eq!(again.id(), original_id);
    }

    #[test]
    fn free_slot_only_reclaims_matching_slot() {
        let pool = BufferPool::new();

        pool.retire(Arc::new(pool.get_buffer(BufferTag::Primary, 0, 64)));
        pool.retire(Arc::new(pool.get_buffer(BufferTag::Primary, 1, 64)));

        assert_eq!(pool.free_slot(BufferTag::Primary, 0), 1);
        assert_eq!(pool.used_count(BufferTag::Primary), 1);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn free_slot_skips_buffers_still_referenced() {
        let pool = BufferPool::new();

        let frozen = Arc::new(pool.get_buffer(BufferTag::Primary, 0, 64));
        let reader = Arc::clone(&frozen);
        pool.retire(frozen);

        // Renderer still holds the packet: nothing may be reclaimed.
        assert_eq!(pool.free_slot(BufferTag::Primary, 0), 0);
        assert_eq!(pool.used_count(BufferTag::Primary), 1);

        drop(reader);
        assert_eq!(pool.free_slot(BufferTag::Primary, 0), 1);
    }

    #[test]
    fn recycled_buffer_is_reset() {
        let pool = BufferPool::new();
        let mut buf = pool.get_buffer(BufferTag::Primary, 0, 64);
        buf.allocate(32, 4).unwrap();
        pool.recycle(buf);

        let again = pool.get_buffer(BufferTag::Primary, 1, 64);
        assert_eq!(again.size(), 0);
        assert_eq!(again.slot(), 1);
    }

    #[test]
    fn tags_partition_used_lists() {
        let pool = BufferPool::new();
        pool.retire(Arc::new(pool.get_buffer(BufferTag::Primary, 0, 64)));
        pool.retire(Arc::new(pool.get_buffer(BufferTag::LightPass, 0, 64)));

        assert_eq!(pool.free_slot(BufferTag::AlbedoPass, 0), 0);
        assert_eq!(pool.free_slot(BufferTag::LightPass, 0), 1);
        assert_eq!(pool.used_count(BufferTag::Primary), 1);
    }
}
