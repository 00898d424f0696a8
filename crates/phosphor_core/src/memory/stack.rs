//! # Stack Allocator
//!
//! Per-frame allocator bound to one `(tag, slot)` pair. Acquires its
//! backing buffer from the pool once per tick, carves typed slices out of
//! it by bump pointer, then freezes the buffer for cross-thread reading.
//!
//! Individual deallocation does not exist - arena semantics. The whole
//! slot is reclaimed later via [`BufferPool::free_slot`].

use std::sync::Arc;

use bytemuck::Pod;

use super::buffer::{Buffer, BufferTag, TypedRange};
use super::error::{MemoryError, MemoryResult};
use super::pool::BufferPool;

/// Builds one frame's transient data inside a single pooled arena buffer.
///
/// Steady-state frames perform zero heap allocation: the backing buffer is
/// recycled from the pool's free list once the slot's previous occupant
/// has been reclaimed.
///
/// ```rust,ignore
/// let mut alloc = StackAllocator::new(pool, BufferTag::Primary, frame % 2);
/// alloc.reserve(total_bytes)?;
/// let meshes = alloc.alloc_slice::<MeshNode>(count)?;
/// alloc.write(meshes)?.copy_from_slice(&nodes);
/// let frozen = alloc.finish()?; // Arc<Buffer>, retired into the pool
/// ```
pub struct StackAllocator {
    pool: Arc<BufferPool>,
    tag: BufferTag,
    slot: u32,
    buffer: Option<Buffer>,
}

impl StackAllocator {
    /// Creates an allocator for the given `(tag, slot)` pair.
    #[must_use]
    pub fn new(pool: Arc<BufferPool>, tag: BufferTag, slot: u32) -> Self {
        Self {
            pool,
            tag,
            slot,
            buffer: None,
        }
    }

    /// The tag this allocator fills.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> BufferTag {
        self.tag
    }

    /// The frame slot this allocator fills.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Acquires the backing buffer, sized for at least `bytes` of payload.
    ///
    /// The single pool acquisition of the frame; calling again after a
    /// successful reserve is a no-op.
    pub fn reserve(&mut self, bytes: usize) {
        if self.buffer.is_none() {
            self.buffer = Some(self.pool.get_buffer(self.tag, self.slot, bytes));
        }
    }

    /// Carves storage for `count` elements of `T` out of the reserved
    /// buffer.
    ///
    /// Fails with [`MemoryError::NotReserved`] before [`reserve`] and with
    /// [`MemoryError::ArenaOverflow`] if the frame was under-provisioned -
    /// a fatal sizing error, since frame packets cannot partially exist.
    ///
    /// [`reserve`]: StackAllocator::reserve
    pub fn alloc_slice<T: Pod>(&mut self, count: usize) -> MemoryResult<TypedRange<T>> {
        self.buffer
            .as_mut()
            .ok_or(MemoryError::NotReserved)?
            .alloc_slice(count)
    }

    /// Mutable access to a carved range, for filling it in.
    pub fn write<T: Pod>(&mut self, range: TypedRange<T>) -> MemoryResult<&mut [T]> {
        Ok(self
            .buffer
            .as_mut()
            .ok_or(MemoryError::NotReserved)?
            .slice_mut(range))
    }

    /// Read access to a carved range.
    pub fn read<T: Pod>(&self, range: TypedRange<T>) -> MemoryResult<&[T]> {
        Ok(self
            .buffer
            .as_ref()
            .ok_or(MemoryError::NotReserved)?
            .slice(range))
    }

    /// Freezes the buffer for cross-thread reading.
    ///
    /// The buffer is retired into the pool's used list under this
    /// allocator's tag and the shared handle returned for the frame packet
    /// to hold. After this point the contents are immutable.
    pub fn finish(mut self) -> MemoryResult<Arc<Buffer>> {
        let buffer = self.buffer.take().ok_or(MemoryError::NotReserved)?;
        let frozen = Arc::new(buffer);
        self.pool.retire(Arc::clone(&frozen));
        Ok(frozen)
    }
}

impl Drop for StackAllocator {
    /// An abandoned frame (error path before `finish`) returns its buffer
    /// to the free list instead of leaking it back to the OS.
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.recycle(buffer);
        }
    }
}
