//! # PHOSPHOR Rendering
//!
//! Deferred-lighting pass pipeline over immutable frame snapshots:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        FRAME PIPELINE                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Scene ──snapshot──► FramePacket (arena-backed, frozen)          │
//! │                           │                                      │
//! │        Pass 0: G-buffer   │  meshes filtered by pass_num         │
//! │        Pass 1: Lights     │  fullscreen quad per light + ambient │
//! │        Pass 2: Composite  ▼  one quad to the backbuffer          │
//! │                      CommandBucket ──sorted──► Driver (backend)  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MANDATE
//!
//! - No allocations against the global heap for per-frame node data
//! - No redundant program binds when consecutive meshes share a material
//! - No native graphics calls - commands stop at the [`Driver`] trait

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod driver;
pub mod error;
pub mod math;
pub mod passes;
pub mod resources;
pub mod scene;

pub use command::{
    BlendMode, Command, CommandBucket, CommandKind, BACKBUFFER, CLEAR_COLOR, CLEAR_DEPTH,
};
pub use driver::{dispatch, Driver, RecordingDriver};
pub use error::{RenderError, RenderResult};
pub use passes::{DeferredPipeline, PipelineConfig, RenderPassDesc};
pub use resources::{BuiltinUniform, ResourceProvider, StaticResources, TextureBinding};
pub use scene::{
    CameraNode, DirectionalLightNode, FramePacket, MeshNode, Projection, Scene, Transform,
};
