//! # Rendering Error Types
//!
//! All errors that can occur while snapshotting scenes and building the
//! pass pipeline. Deferred rendering has no meaningful partial-frame
//! degraded state, so every variant here is treated as fatal by callers.

use phosphor_core::MemoryError;
use thiserror::Error;

/// Errors that can occur in the rendering core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No camera node matches the pass that needs one.
    ///
    /// A configuration error: every configured pass pipeline must have a
    /// camera for its primary pass before packets are built.
    #[error("no camera node with pass_num {pass}")]
    CameraMissing {
        /// The pass index that found no camera.
        pass: u32,
    },

    /// Frame memory could not be carved for the packet.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
