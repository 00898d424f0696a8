//! # Arena Buffer
//!
//! A single contiguous memory block with bump-pointer allocation, tagged by
//! the logical frame slot it currently backs. Allocations are never freed
//! individually; the whole buffer is reset in O(1) when its slot is
//! reclaimed.

use std::marker::PhantomData;

use bytemuck::Pod;

use super::error::{MemoryError, MemoryResult};

/// Logical purpose of a buffer.
///
/// Used purely as a partition key for the pool's used lists, not for type
/// safety of contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BufferTag {
    /// Primary frame packet (geometry pass input).
    Primary = 0,
    /// Light accumulation pass frame data.
    LightPass = 1,
    /// Albedo composite pass frame data.
    AlbedoPass = 2,
}

impl BufferTag {
    /// Number of tag values (size of the pool's used-list partition).
    pub const COUNT: usize = 3;

    /// Returns the partition index for this tag.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A byte range carved out of a [`Buffer`].
///
/// Ranges are plain offsets: they stay valid as long as the buffer is not
/// reset, and they never dangle - resolving one after a reset panics on the
/// bounds check instead of reading stale memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferRange {
    /// Byte offset of the first byte.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
}

/// A typed element range carved out of a [`Buffer`].
///
/// Produced by [`Buffer::alloc_slice`]; resolved back to `&[T]` /
/// `&mut [T]` through the owning buffer.
#[derive(Clone, Copy, Debug)]
pub struct TypedRange<T> {
    range: BufferRange,
    count: usize,
    _marker: PhantomData<T>,
}

impl<T> TypedRange<T> {
    /// Number of `T` elements in the range.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the range holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The underlying byte range.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> BufferRange {
        self.range
    }
}

/// Maximum element alignment the buffer guarantees.
///
/// Storage is backed by `u64` words, so any `T` with alignment up to 8
/// can be carved out without unsafe code.
pub(crate) const MAX_ALIGN: usize = 8;

/// A fixed-capacity bump-allocated arena.
///
/// Owns one contiguous block, tracks bytes consumed, and carries the
/// `(tag, slot)` identifying which logical per-frame slot it currently
/// backs. The block is allocated once and freed exactly once, when the
/// buffer is dropped at pool teardown.
///
/// # Thread Safety
///
/// A buffer is filled by exactly one thread (exclusive ownership during
/// construction), then frozen behind an `Arc` for read-only access.
#[derive(Debug)]
pub struct Buffer {
    /// Backing storage, 8-byte aligned by construction.
    storage: Box<[u64]>,
    /// Usable capacity in bytes.
    capacity: usize,
    /// Bytes consumed by the bump allocator.
    size: usize,
    /// Logical purpose of the current occupant.
    tag: BufferTag,
    /// Frame slot (generation id) of the current occupant.
    slot: u32,
    /// Pool-unique identity, stable across recycling.
    id: u64,
}

impl Buffer {
    /// Creates a buffer with at least `capacity` usable bytes.
    ///
    /// Capacity is rounded up to a whole number of 8-byte words.
    pub(crate) fn new(capacity: usize, tag: BufferTag, slot: u32, id: u64) -> Self {
        let words = capacity.div_ceil(MAX_ALIGN);
        let storage = vec![0u64; words].into_boxed_slice();
        Self {
            capacity: words * MAX_ALIGN,
            storage,
            size: 0,
            tag,
            slot,
            id,
        }
    }

    /// Total usable capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Bytes still available.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity - self.size
    }

    /// The tag of the slot this buffer currently backs.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> BufferTag {
        self.tag
    }

    /// The frame slot this buffer currently backs.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Pool-unique identity, stable across recycling.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Re-associates the buffer with a new `(tag, slot)` occupant.
    pub(crate) fn retag(&mut self, tag: BufferTag, slot: u32) {
        self.tag = tag;
        self.slot = slot;
    }

    /// Bump-allocates `len` bytes aligned to `align`.
    ///
    /// Returns the carved range, or [`MemoryError::ArenaOverflow`] if the
    /// padded request does not fit. A failed allocation leaves all prior
    /// allocations and the cursor untouched.
    ///
    /// `align` must be a power of two no larger than 8.
    pub fn allocate(&mut self, len: usize, align: usize) -> MemoryResult<BufferRange> {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
        debug_assert!(align <= MAX_ALIGN, "alignment above 8 is not supported");

        let aligned = (self.size + align - 1) & !(align - 1);
        let end = aligned.saturating_add(len);
        if end > self.capacity {
            return Err(MemoryError::ArenaOverflow {
                requested: end - self.size,
                remaining: self.remaining(),
            });
        }
        self.size = end;
        Ok(BufferRange {
            offset: aligned,
            len,
        })
    }

    /// Bump-allocates storage for `count` elements of `T`.
    pub fn alloc_slice<T: Pod>(&mut self, count: usize) -> MemoryResult<TypedRange<T>> {
        let range = self.allocate(count * std::mem::size_of::<T>(), std::mem::align_of::<T>())?;
        Ok(TypedRange {
            range,
            count,
            _marker: PhantomData,
        })
    }

    /// Resolves a typed range to an immutable slice.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the allocated region (stale range
    /// after a reset).
    #[must_use]
    pub fn slice<T: Pod>(&self, range: TypedRange<T>) -> &[T] {
        let r = range.range;
        assert!(
            r.offset + r.len <= self.size,
            "buffer range {}..{} outside allocated region (size {})",
            r.offset,
            r.offset + r.len,
            self.size
        );
        let bytes: &[u8] = bytemuck::cast_slice(&self.storage);
        bytemuck::cast_slice(&bytes[r.offset..r.offset + r.len])
    }

    /// Resolves a typed range to a mutable slice.
    ///
    /// Only available while the buffer is exclusively owned (before it is
    /// frozen behind an `Arc`).
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the allocated region.
    pub fn slice_mut<T: Pod>(&mut self, range: TypedRange<T>) -> &mut [T] {
        let r = range.range;
        assert!(
            r.offset + r.len <= self.size,
            "buffer range {}..{} outside allocated region (size {})",
            r.offset,
            r.offset + r.len,
            self.size
        );
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.storage);
        bytemuck::cast_slice_mut(&mut bytes[r.offset..r.offset + r.len])
    }

    /// Resets the bump cursor, invalidating all previously carved ranges.
    ///
    /// O(1): no memory is freed or zeroed.
    #[inline]
    pub fn reset(&mut self) {
        self.size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_buffer(capacity: usize) -> Buffer {
        Buffer::new(capacity, BufferTag::Primary, 0, 0)
    }

    #[test]
    fn allocations_are_aligned_and_disjoint() {
        let mut buf = test_buffer(1024);

        let a = buf.allocate(3, 1).unwrap();
        let b = buf.allocate(8, 8).unwrap();
        let c = buf.allocate(4, 4).unwrap();

        assert_eq!(b.offset % 8, 0);
        assert_eq!(c.offset % 4, 0);
        assert!(a.offset + a.len <= b.offset);
        assert!(b.offset + b.len <= c.offset);
    }

    #[test]
    fn overflow_fails_without_corrupting_prior_allocations() {
        let mut buf = test_buffer(64);

        let first = buf.alloc_slice::<u32>(8).unwrap();
        buf.slice_mut(first).copy_from_slice(&[7u32; 8]);
        let size_before = buf.size();

        let err = buf.allocate(1024, 4).unwrap_err();
        assert!(matches!(err, MemoryError::ArenaOverflow { .. }));

        // Cursor untouched, data intact.
        assert_eq!(buf.size(), size_before);
        assert_eq!(buf.slice(first), &[7u32; 8]);
    }

    #[test]
    fn reset_is_deterministic() {
        let mut buf = test_buffer(256);

        let offsets_before: Vec<usize> = [(3usize, 1usize), (16, 8), (5, 4), (12, 4)]
            .iter()
            .map(|&(len, align)| buf.allocate(len, align).unwrap().offset)
            .collect();

        buf.reset();
        assert_eq!(buf.size(), 0);

        let offsets_after: Vec<usize> = [(3usize, 1usize), (16, 8), (5, 4), (12, 4)]
            .iter()
            .map(|&(len, align)| buf.allocate(len, align).unwrap().offset)
            .collect();

        assert_eq!(offsets_before, offsets_after);
    }

    #[test]
    fn typed_slices_round_trip() {
        let mut buf = test_buffer(256);
        let range = buf.alloc_slice::<f32>(4).unwrap();

        buf.slice_mut(range).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.slice(range), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn zero_length_slice_is_empty() {
        let mut buf = test_buffer(64);
        let range = buf.alloc_slice::<f32>(0).unwrap();
        assert!(range.is_empty());
        assert!(buf.slice(range).is_empty());
    }

    #[test]
    #[should_panic(expected = "outside allocated region")]
    fn stale_range_panics_after_reset() {
        let mut buf = test_buffer(64);
        let range = buf.alloc_slice::<u32>(4).unwrap();
        buf.reset();
        let _ = buf.slice(range);
    }
}
