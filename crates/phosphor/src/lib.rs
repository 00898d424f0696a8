//! # PHOSPHOR Engine
//!
//! The orchestrator tying the core and rendering crates into a running
//! engine.
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ SIMULATION THREAD                                               │
//! │   ├─ updater(&mut scene, dt)                                    │
//! │   ├─ reclaim slot N % 2, free its arena slot                    │
//! │   ├─ snapshot scene → FramePacket (one pool acquisition)        │
//! │   └─ publish → blocks until renderer caught up (≤ 1 frame lead) │
//! │                                                                 │
//! │ RENDER THREAD                                                   │
//! │   ├─ wait for published frame                                   │
//! │   ├─ fresh CommandBucket                                        │
//! │   ├─ DeferredPipeline::execute (G-buffer → lights → composite)  │
//! │   ├─ dispatch to Driver, present                                │
//! │   └─ advance rendered counter (wakes simulation)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod stats;

pub use config::EngineConfig;
pub use engine::{Engine, EngineError, EngineHandle, EngineReport, EngineResult};
pub use stats::{FrameStats, FrameStatsAccumulator};
