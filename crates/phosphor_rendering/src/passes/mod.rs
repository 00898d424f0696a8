//! # Render Passes
//!
//! The fixed multi-pass deferred-lighting sequence and its configuration.

mod deferred;

pub use deferred::{DeferredPipeline, PipelineConfig, RenderPassDesc};
