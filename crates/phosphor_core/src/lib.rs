//! # PHOSPHOR Core
//!
//! Frame memory and thread handshake machinery designed for:
//! - Zero heap allocations per frame after steady state
//! - Two threads (simulation, render) exchanging immutable frame snapshots
//! - Stale frame memory reclaimed two generations late, never early
//!
//! ## Architecture Rules
//!
//! 1. **All per-frame data lives in tagged arenas** - carved by bump pointer,
//!    recycled by `(tag, slot)` once the render thread has moved past them
//! 2. **The pool lock is coarse and rare** - one acquisition per simulation
//!    tick, never per draw call
//! 3. **Waits block, they do not spin** - the exchange parks on a condvar
//!    and shutdown wakes every waiter
//!
//! ## Example
//!
//! ```rust,ignore
//! use phosphor_core::{BufferPool, BufferTag, StackAllocator};
//!
//! let pool = std::sync::Arc::new(BufferPool::new());
//! let mut alloc = StackAllocator::new(pool, BufferTag::Primary, 0);
//! // Carve this frame's transient data out of one recycled block
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod memory;
pub mod sync;

pub use memory::{
    Buffer, BufferPool, BufferRange, BufferTag, MemoryError, MemoryResult, StackAllocator,
    TypedRange, BUFFER_SLACK, PAGE_SIZE,
};
pub use sync::FrameExchange;
