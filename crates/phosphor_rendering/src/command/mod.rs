//! # Render Commands
//!
//! The closed set of draw/state operations emitted by the pass pipeline
//! and executed by a backend [`Driver`](crate::driver::Driver).
//!
//! Each variant has its own payload struct and, inside the bucket, its
//! own contiguous store; a single sorted index unifies dispatch order.

mod bucket;

pub use bucket::{Command, CommandBucket, SortedCommand};

/// Sentinel framebuffer id addressing the default backbuffer.
pub const BACKBUFFER: u32 = u32::MAX;

/// Clear-mask bit selecting the color attachment.
pub const CLEAR_COLOR: u32 = 1 << 0;
/// Clear-mask bit selecting the depth attachment.
pub const CLEAR_DEPTH: u32 = 1 << 1;

/// Blend configuration for a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Blending disabled.
    #[default]
    Opaque,
    /// Additive blending (light accumulation).
    Additive,
}

/// Variant tag of a command.
///
/// The tag is encoded in the low byte of every sort key so the backend
/// can dispatch through a type-indexed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    /// Bind a render target.
    BindFrameBuffer = 0,
    /// Set the viewport rectangle.
    SetViewport = 1,
    /// Clear attachments of the bound framebuffer.
    ClearFrameBuffer = 2,
    /// Enable or disable depth testing.
    SetDepthTest = 3,
    /// Select the blend mode.
    SetBlendMode = 4,
    /// Bind a shader program.
    BindProgram = 5,
    /// Bind mesh geometry.
    BindMesh = 6,
    /// Bind a texture to a unit and sampler location.
    BindTexture = 7,
    /// Upload a mat4 uniform.
    BindUniformMat4 = 8,
    /// Upload a vec3 uniform.
    BindUniformVec3 = 9,
    /// Upload a float uniform.
    BindUniformFloat = 10,
    /// Upload an int uniform.
    BindUniformInt = 11,
    /// Draw indexed geometry.
    DrawElements = 12,
}

impl CommandKind {
    /// Decodes a kind from its sort-key tag byte.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::BindFrameBuffer,
            1 => Self::SetViewport,
            2 => Self::ClearFrameBuffer,
            3 => Self::SetDepthTest,
            4 => Self::SetBlendMode,
            5 => Self::BindProgram,
            6 => Self::BindMesh,
            7 => Self::BindTexture,
            8 => Self::BindUniformMat4,
            9 => Self::BindUniformVec3,
            10 => Self::BindUniformFloat,
            11 => Self::BindUniformInt,
            12 => Self::DrawElements,
            _ => return None,
        })
    }
}

/// Bind a render target; [`BACKBUFFER`] addresses the default one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindFrameBufferCommand {
    /// Opaque framebuffer id.
    pub framebuffer: u32,
}

/// Set the viewport rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetViewportCommand {
    /// Left edge in pixels.
    pub x: i32,
    /// Bottom edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Clear attachments of the bound framebuffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearFrameBufferCommand {
    /// Bitwise OR of [`CLEAR_COLOR`] and [`CLEAR_DEPTH`].
    pub mask: u32,
    /// Clear color, RGBA.
    pub color: [f32; 4],
}

/// Enable or disable depth testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetDepthTestCommand {
    /// Whether depth testing is enabled.
    pub enabled: bool,
}

/// Select the blend mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetBlendModeCommand {
    /// The blend mode to apply.
    pub mode: BlendMode,
}

/// Bind a shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindProgramCommand {
    /// Opaque program id.
    pub program: u32,
}

/// Bind mesh geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindMeshCommand {
    /// Opaque mesh id.
    pub mesh: u32,
}

/// Bind a texture to a unit and sampler location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindTextureCommand {
    /// Opaque texture id.
    pub texture: u32,
    /// Texture unit index.
    pub unit: u32,
    /// Sampler uniform location.
    pub location: i32,
}

/// Upload a mat4 uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindUniformMat4Command {
    /// Uniform location.
    pub location: i32,
    /// Column-major matrix value.
    pub value: [[f32; 4]; 4],
}

/// Upload a vec3 uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindUniformVec3Command {
    /// Uniform location.
    pub location: i32,
    /// Vector value.
    pub value: [f32; 3],
}

/// Upload a float uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindUniformFloatCommand {
    /// Uniform location.
    pub location: i32,
    /// Scalar value.
    pub value: f32,
}

/// Upload an int uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindUniformIntCommand {
    /// Uniform location.
    pub location: i32,
    /// Scalar value.
    pub value: i32,
}

/// Draw indexed geometry from the bound mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawElementsCommand {
    /// Number of indices to draw.
    pub index_count: u32,
}
