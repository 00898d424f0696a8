//! # Memory Error Types
//!
//! All errors that can occur in the frame memory system.

use thiserror::Error;

/// Errors that can occur while carving frame memory out of an arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// An allocation would overflow the arena's fixed capacity.
    ///
    /// Arenas are provisioned once and never grow; overflowing one is a
    /// sizing bug, not a recoverable condition. Frame packets cannot
    /// partially exist.
    #[error("arena overflow: requested {requested} bytes, {remaining} remaining")]
    ArenaOverflow {
        /// Bytes requested by the failing allocation (including padding).
        requested: usize,
        /// Bytes still unused in the arena.
        remaining: usize,
    },

    /// A stack allocator was used before reserving its backing buffer.
    #[error("stack allocator has no backing buffer; call reserve() first")]
    NotReserved,
}

/// Result type for frame memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
