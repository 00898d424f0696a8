//! # Thread Handshake
//!
//! The double-buffered frame exchange between the simulation and render
//! threads.

mod exchange;

pub use exchange::FrameExchange;
