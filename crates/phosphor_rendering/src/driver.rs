//! # Execution Backend Boundary
//!
//! A [`Driver`] translates abstract commands into native graphics calls.
//! The pipeline's only contract with it: commands are executed in the
//! order [`CommandBucket::sorted_commands`] returns them, and every
//! command kind maps 1:1 to a driver method.
//!
//! [`RecordingDriver`] executes nothing and records everything - the
//! backend for tests and headless runs.

use crate::command::{
    BindFrameBufferCommand, BindMeshCommand, BindProgramCommand, BindTextureCommand,
    BindUniformFloatCommand, BindUniformIntCommand, BindUniformMat4Command,
    BindUniformVec3Command, ClearFrameBufferCommand, Command, CommandBucket, CommandKind,
    DrawElementsCommand, SetBlendModeCommand, SetDepthTestCommand, SetViewportCommand,
};

/// An execution backend for command buckets.
///
/// One method per command kind - the type-indexed dispatch table. The
/// driver owns the graphics context; it is created on the render thread
/// and never leaves it.
pub trait Driver {
    /// Called once before a frame's commands.
    fn begin_frame(&mut self) {}

    /// Binds a render target.
    fn bind_framebuffer(&mut self, cmd: &BindFrameBufferCommand);
    /// Sets the viewport rectangle.
    fn set_viewport(&mut self, cmd: &SetViewportCommand);
    /// Clears attachments of the bound framebuffer.
    fn clear_framebuffer(&mut self, cmd: &ClearFrameBufferCommand);
    /// Enables or disables depth testing.
    fn set_depth_test(&mut self, cmd: &SetDepthTestCommand);
    /// Selects the blend mode.
    fn set_blend_mode(&mut self, cmd: &SetBlendModeCommand);
    /// Binds a shader program.
    fn bind_program(&mut self, cmd: &BindProgramCommand);
    /// Binds mesh geometry.
    fn bind_mesh(&mut self, cmd: &BindMeshCommand);
    /// Binds a texture.
    fn bind_texture(&mut self, cmd: &BindTextureCommand);
    /// Uploads a mat4 uniform.
    fn bind_uniform_mat4(&mut self, cmd: &BindUniformMat4Command);
    /// Uploads a vec3 uniform.
    fn bind_uniform_vec3(&mut self, cmd: &BindUniformVec3Command);
    /// Uploads a float uniform.
    fn bind_uniform_float(&mut self, cmd: &BindUniformFloatCommand);
    /// Uploads an int uniform.
    fn bind_uniform_int(&mut self, cmd: &BindUniformIntCommand);
    /// Draws indexed geometry.
    fn draw_elements(&mut self, cmd: &DrawElementsCommand);

    /// Called once after a frame's commands; swaps/presents.
    fn present(&mut self) {}
}

/// Executes a bucket against a driver, in sorted order.
pub fn dispatch(bucket: &mut CommandBucket, driver: &mut dyn Driver) {
    for command in bucket.sorted_commands() {
        match command {
            Command::BindFrameBuffer(c) => driver.bind_framebuffer(c),
            Command::SetViewport(c) => driver.set_viewport(c),
            Command::ClearFrameBuffer(c) => driver.clear_framebuffer(c),
            Command::SetDepthTest(c) => driver.set_depth_test(c),
            Command::SetBlendMode(c) => driver.set_blend_mode(c),
            Command::BindProgram(c) => driver.bind_program(c),
            Command::BindMesh(c) => driver.bind_mesh(c),
            Command::BindTexture(c) => driver.bind_texture(c),
            Command::BindUniformMat4(c) => driver.bind_uniform_mat4(c),
            Command::BindUniformVec3(c) => driver.bind_uniform_vec3(c),
            Command::BindUniformFloat(c) => driver.bind_uniform_float(c),
            Command::BindUniformInt(c) => driver.bind_uniform_int(c),
            Command::DrawElements(c) => driver.draw_elements(c),
        }
    }
}

/// A backend that records instead of rendering.
///
/// Keeps the executed kind sequence and per-kind counters; used by unit
/// tests and the headless demo.
#[derive(Default)]
pub struct RecordingDriver {
    /// Kind of every executed command, in execution order.
    pub executed: Vec<CommandKind>,
    /// Frames begun.
    pub frames_begun: u64,
    /// Frames presented.
    pub frames_presented: u64,
}

impl RecordingDriver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of executed commands of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: CommandKind) -> usize {
        self.executed.iter().filter(|&&k| k == kind).count()
    }

    fn record(&mut self, kind: CommandKind) {
        self.executed.push(kind);
    }
}

impl Driver for RecordingDriver {
    fn begin_frame(&mut self) {
        self.frames_begun += 1;
    }

    fn bind_framebuffer(&mut self, _cmd: &BindFrameBufferCommand) {
        self.record(CommandKind::BindFrameBuffer);
    }

    fn set_viewport(&mut self, _cmd: &SetViewportCommand) {
        self.record(CommandKind::SetViewport);
    }

    fn clear_framebuffer(&mut self, _cmd: &ClearFrameBufferCommand) {
        self.record(CommandKind::ClearFrameBuffer);
    }

    fn set_depth_test(&mut self, _cmd: &SetDepthTestCommand) {
        self.record(CommandKind::SetDepthTest);
    }

    fn set_blend_mode(&mut self, _cmd: &SetBlendModeCommand) {
        self.record(CommandKind::SetBlendMode);
    }

    fn bind_program(&mut self, _cmd: &BindProgramCommand) {
        self.record(CommandKind::BindProgram);
    }

    fn bind_mesh(&mut self, _cmd: &BindMeshCommand) {
        self.record(CommandKind::BindMesh);
    }

    fn bind_texture(&mut self, _cmd: &BindTextureCommand) {
        self.record(CommandKind::BindTexture);
    }

    fn bind_uniform_mat4(&mut self, _cmd: &BindUniformMat4Command) {
        self.record(CommandKind::BindUniformMat4);
    }

    fn bind_uniform_vec3(&mut self, _cmd: &BindUniformVec3Command) {
        self.record(CommandKind::BindUniformVec3);
    }

    fn bind_uniform_float(&mut self, _cmd: &BindUniformFloatCommand) {
        self.record(CommandKind::BindUniformFloat);
    }

    fn bind_uniform_int(&mut self, _cmd: &BindUniformIntCommand) {
        self.record(CommandKind::BindUniformInt);
    }

    fn draw_elements(&mut self, _cmd: &DrawElementsCommand) {
        self.record(CommandKind::DrawElements);
    }

    fn present(&mut self) {
        self.frames_presented += 1;
    }
}
