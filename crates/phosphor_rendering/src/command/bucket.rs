//! # Command Bucket
//!
//! Intermediate representation of one frame's draw/state operations.
//!
//! Each command variant gets its own contiguous store so payload memory is
//! homogeneous and stable; a single ordered index of lightweight
//! `(sort_key, index)` entries gives the backend one unified walk. The
//! sort is stable: keys tie only on the variant tag, so insertion order
//! within a variant is preserved.
//!
//! This is a pure builder - there are no failure modes. Invalid ids or
//! locations are a backend validation concern.

use super::{
    BindFrameBufferCommand, BindMeshCommand, BindProgramCommand, BindTextureCommand,
    BindUniformFloatCommand, BindUniformIntCommand, BindUniformMat4Command,
    BindUniformVec3Command, BlendMode, ClearFrameBufferCommand, CommandKind, DrawElementsCommand,
    SetBlendModeCommand, SetDepthTestCommand, SetViewportCommand,
};

/// An entry in the bucket's master dispatch index.
///
/// The low byte of `key` encodes the command's variant tag; upper bits
/// are reserved for future batching priority.
#[derive(Clone, Copy, Debug)]
pub struct SortedCommand {
    /// Sort key; low byte is the [`CommandKind`] tag.
    pub key: u64,
    /// Index into the variant's homogeneous store.
    pub index: u32,
}

/// A reference to one command, resolved for dispatch.
#[derive(Clone, Copy, Debug)]
pub enum Command<'a> {
    /// Bind a render target.
    BindFrameBuffer(&'a BindFrameBufferCommand),
    /// Set the viewport rectangle.
    SetViewport(&'a SetViewportCommand),
    /// Clear attachments.
    ClearFrameBuffer(&'a ClearFrameBufferCommand),
    /// Enable or disable depth testing.
    SetDepthTest(&'a SetDepthTestCommand),
    /// Select the blend mode.
    SetBlendMode(&'a SetBlendModeCommand),
    /// Bind a shader program.
    BindProgram(&'a BindProgramCommand),
    /// Bind mesh geometry.
    BindMesh(&'a BindMeshCommand),
    /// Bind a texture.
    BindTexture(&'a BindTextureCommand),
    /// Upload a mat4 uniform.
    BindUniformMat4(&'a BindUniformMat4Command),
    /// Upload a vec3 uniform.
    BindUniformVec3(&'a BindUniformVec3Command),
    /// Upload a float uniform.
    BindUniformFloat(&'a BindUniformFloatCommand),
    /// Upload an int uniform.
    BindUniformInt(&'a BindUniformIntCommand),
    /// Draw indexed geometry.
    DrawElements(&'a DrawElementsCommand),
}

impl Command<'_> {
    /// The variant tag of this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::BindFrameBuffer(_) => CommandKind::BindFrameBuffer,
            Self::SetViewport(_) => CommandKind::SetViewport,
            Self::ClearFrameBuffer(_) => CommandKind::ClearFrameBuffer,
            Self::SetDepthTest(_) => CommandKind::SetDepthTest,
            Self::SetBlendMode(_) => CommandKind::SetBlendMode,
            Self::BindProgram(_) => CommandKind::BindProgram,
            Self::BindMesh(_) => CommandKind::BindMesh,
            Self::BindTexture(_) => CommandKind::BindTexture,
            Self::BindUniformMat4(_) => CommandKind::BindUniformMat4,
            Self::BindUniformVec3(_) => CommandKind::BindUniformVec3,
            Self::BindUniformFloat(_) => CommandKind::BindUniformFloat,
            Self::BindUniformInt(_) => CommandKind::BindUniformInt,
            Self::DrawElements(_) => CommandKind::DrawElements,
        }
    }
}

/// One frame's commands, partitioned by variant with a unified sorted
/// index.
///
/// Constructed fresh each frame by the render thread and discarded after
/// dispatch.
#[derive(Default)]
pub struct CommandBucket {
    bind_framebuffer: Vec<BindFrameBufferCommand>,
    set_viewport: Vec<SetViewportCommand>,
    clear_framebuffer: Vec<ClearFrameBufferCommand>,
    set_depth_test: Vec<SetDepthTestCommand>,
    set_blend_mode: Vec<SetBlendModeCommand>,
    bind_program: Vec<BindProgramCommand>,
    bind_mesh: Vec<BindMeshCommand>,
    bind_texture: Vec<BindTextureCommand>,
    bind_mat4: Vec<BindUniformMat4Command>,
    bind_vec3: Vec<BindUniformVec3Command>,
    bind_float: Vec<BindUniformFloatCommand>,
    bind_int: Vec<BindUniformIntCommand>,
    draw_elements: Vec<DrawElementsCommand>,
    /// Master dispatch index, sorted lazily by `sorted_commands`.
    order: Vec<SortedCommand>,
}

impl CommandBucket {
    /// Creates an empty bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_order(&mut self, kind: CommandKind, index: usize) {
        self.order.push(SortedCommand {
            key: kind as u64,
            index: index as u32,
        });
    }

    /// Appends a framebuffer bind.
    pub fn bind_framebuffer(&mut self, framebuffer: u32) {
        self.bind_framebuffer
            .push(BindFrameBufferCommand { framebuffer });
        self.push_order(CommandKind::BindFrameBuffer, self.bind_framebuffer.len() - 1);
    }

    /// Appends a viewport change.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.set_viewport.push(SetViewportCommand {
            x,
            y,
            width,
            height,
        });
        self.push_order(CommandKind::SetViewport, self.set_viewport.len() - 1);
    }

    /// Appends a clear of the bound framebuffer.
    pub fn clear_framebuffer(&mut self, mask: u32, color: [f32; 4]) {
        self.clear_framebuffer
            .push(ClearFrameBufferCommand { mask, color });
        self.push_order(CommandKind::ClearFrameBuffer, self.clear_framebuffer.len() - 1);
    }

    /// Appends a depth-test toggle.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.set_depth_test.push(SetDepthTestCommand { enabled });
        self.push_order(CommandKind::SetDepthTest, self.set_depth_test.len() - 1);
    }

    /// Appends a blend-mode change.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.set_blend_mode.push(SetBlendModeCommand { mode });
        self.push_order(CommandKind::SetBlendMode, self.set_blend_mode.len() - 1);
    }

    /// Appends a program bind.
    pub fn bind_program(&mut self, program: u32) {
        self.bind_program.push(BindProgramCommand { program });
        self.push_order(CommandKind::BindProgram, self.bind_program.len() - 1);
    }

    /// Appends a mesh bind.
    pub fn bind_mesh(&mut self, mesh: u32) {
        self.bind_mesh.push(BindMeshCommand { mesh });
        self.push_order(CommandKind::BindMesh, self.bind_mesh.len() - 1);
    }

    /// Appends a texture bind.
    pub fn bind_texture(&mut self, texture: u32, unit: u32, location: i32) {
        self.bind_texture.push(BindTextureCommand {
            texture,
            unit,
            location,
        });
        self.push_order(CommandKind::BindTexture, self.bind_texture.len() - 1);
    }

    /// Appends a mat4 uniform upload.
    pub fn bind_uniform_mat4(&mut self, location: i32, value: [[f32; 4]; 4]) {
        self.bind_mat4.push(BindUniformMat4Command { location, value });
        self.push_order(CommandKind::BindUniformMat4, self.bind_mat4.len() - 1);
    }

    /// Appends a vec3 uniform upload.
    pub fn bind_uniform_vec3(&mut self, location: i32, value: [f32; 3]) {
        self.bind_vec3.push(BindUniformVec3Command { location, value });
        self.push_order(CommandKind::BindUniformVec3, self.bind_vec3.len() - 1);
    }

    /// Appends a float uniform upload.
    pub fn bind_uniform_float(&mut self, location: i32, value: f32) {
        self.bind_float.push(BindUniformFloatCommand { location, value });
        self.push_order(CommandKind::BindUniformFloat, self.bind_float.len() - 1);
    }

    /// Appends an int uniform upload.
    pub fn bind_uniform_int(&mut self, location: i32, value: i32) {
        self.bind_int.push(BindUniformIntCommand { location, value });
        self.push_order(CommandKind::BindUniformInt, self.bind_int.len() - 1);
    }

    /// Appends an indexed draw.
    pub fn draw_elements(&mut self, index_count: u32) {
        self.draw_elements.push(DrawElementsCommand { index_count });
        self.push_order(CommandKind::DrawElements, self.draw_elements.len() - 1);
    }

    /// Total number of commands in the bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no commands were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of commands of one variant.
    #[must_use]
    pub fn count_of(&self, kind: CommandKind) -> usize {
        match kind {
            CommandKind::BindFrameBuffer => self.bind_framebuffer.len(),
            CommandKind::SetViewport => self.set_viewport.len(),
            CommandKind::ClearFrameBuffer => self.clear_framebuffer.len(),
            CommandKind::SetDepthTest => self.set_depth_test.len(),
            CommandKind::SetBlendMode => self.set_blend_mode.len(),
            CommandKind::BindProgram => self.bind_program.len(),
            CommandKind::BindMesh => self.bind_mesh.len(),
            CommandKind::BindTexture => self.bind_texture.len(),
            CommandKind::BindUniformMat4 => self.bind_mat4.len(),
            CommandKind::BindUniformVec3 => self.bind_vec3.len(),
            CommandKind::BindUniformFloat => self.bind_float.len(),
            CommandKind::BindUniformInt => self.bind_int.len(),
            CommandKind::DrawElements => self.draw_elements.len(),
        }
    }

    /// Clears all stores for reuse.
    pub fn clear(&mut self) {
        self.bind_framebuffer.clear();
        self.set_viewport.clear();
        self.clear_framebuffer.clear();
        self.set_depth_test.clear();
        self.set_blend_mode.clear();
        self.bind_program.clear();
        self.bind_mesh.clear();
        self.bind_texture.clear();
        self.bind_mat4.clear();
        self.bind_vec3.clear();
        self.bind_float.clear();
        self.bind_int.clear();
        self.draw_elements.clear();
        self.order.clear();
    }

    fn resolve(&self, entry: SortedCommand) -> Command<'_> {
        let kind = CommandKind::from_tag((entry.key & 0xff) as u8)
            .expect("sort key carries a valid command tag");
        let i = entry.index as usize;
        match kind {
            CommandKind::BindFrameBuffer => Command::BindFrameBuffer(&self.bind_framebuffer[i]),
            CommandKind::SetViewport => Command::SetViewport(&self.set_viewport[i]),
            CommandKind::ClearFrameBuffer => Command::ClearFrameBuffer(&self.clear_framebuffer[i]),
            CommandKind::SetDepthTest => Command::SetDepthTest(&self.set_depth_test[i]),
            CommandKind::SetBlendMode => Command::SetBlendMode(&self.set_blend_mode[i]),
            CommandKind::BindProgram => Command::BindProgram(&self.bind_program[i]),
            CommandKind::BindMesh => Command::BindMesh(&self.bind_mesh[i]),
            CommandKind::BindTexture => Command::BindTexture(&self.bind_texture[i]),
            CommandKind::BindUniformMat4 => Command::BindUniformMat4(&self.bind_mat4[i]),
            CommandKind::BindUniformVec3 => Command::BindUniformVec3(&self.bind_vec3[i]),
            CommandKind::BindUniformFloat => Command::BindUniformFloat(&self.bind_float[i]),
            CommandKind::BindUniformInt => Command::BindUniformInt(&self.bind_int[i]),
            CommandKind::DrawElements => Command::DrawElements(&self.draw_elements[i]),
        }
    }

    /// The master index in dispatch order.
    ///
    /// Stable sort by the key's priority bits; the low tag byte exists
    /// for dispatch decoding, not ordering. All priorities are currently
    /// zero, so every entry ties and recorded order is execution order -
    /// future material batching can raise priorities without touching
    /// dispatch.
    pub fn sorted_commands(&mut self) -> impl Iterator<Item = Command<'_>> {
        self.order.sort_by_key(|c| c.key >> 8);
        let this: &Self = self;
        this.order.iter().map(move |&entry| this.resolve(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_dispatch_order() {
        let mut bucket = CommandBucket::new();
        bucket.draw_elements(6); // A
        bucket.bind_texture(1, 0, 3); // B
        bucket.draw_elements(36); // C

        // Equal priorities tie, so dispatch order is insertion order even
        // across variants.
        let kinds: Vec<CommandKind> = bucket.sorted_commands().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                CommandKind::DrawElements,
                CommandKind::BindTexture,
                CommandKind::DrawElements,
            ]
        );

        // Same-variant ties keep insertion order.
        let draws: Vec<u32> = bucket
            .sorted_commands()
            .filter_map(|c| match c {
                Command::DrawElements(d) => Some(d.index_count),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![6, 36]);
    }

    #[test]
    fn sort_keys_carry_the_variant_tag() {
        let mut bucket = CommandBucket::new();
        bucket.bind_mesh(4);
        bucket.bind_program(2);

        for cmd in bucket.sorted_commands() {
            match cmd {
                Command::BindMesh(c) => assert_eq!(c.mesh, 4),
                Command::BindProgram(c) => assert_eq!(c.program, 2),
                other => panic!("unexpected command {:?}", other.kind()),
            }
        }
    }

    #[test]
    fn each_uniform_type_lands_in_its_own_store() {
        let mut bucket = CommandBucket::new();
        bucket.bind_uniform_mat4(0, [[0.0; 4]; 4]);
        bucket.bind_uniform_vec3(1, [1.0, 2.0, 3.0]);
        bucket.bind_uniform_float(2, 0.5);
        bucket.bind_uniform_int(3, 7);

        assert_eq!(bucket.count_of(CommandKind::BindUniformMat4), 1);
        assert_eq!(bucket.count_of(CommandKind::BindUniformVec3), 1);
        assert_eq!(bucket.count_of(CommandKind::BindUniformFloat), 1);
        assert_eq!(bucket.count_of(CommandKind::BindUniformInt), 1);

        // And each index entry resolves to its own type's payload.
        let locations: Vec<i32> = bucket
            .sorted_commands()
            .map(|c| match c {
                Command::BindUniformMat4(u) => u.location,
                Command::BindUniformVec3(u) => u.location,
                Command::BindUniformFloat(u) => u.location,
                Command::BindUniformInt(u) => u.location,
                other => panic!("unexpected command {:?}", other.kind()),
            })
            .collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);
    }

    #[test]
    fn clear_empties_every_store() {
        let mut bucket = CommandBucket::new();
        bucket.bind_framebuffer(0);
        bucket.set_viewport(0, 0, 64, 64);
        bucket.clear_framebuffer(super::super::CLEAR_COLOR, [0.0; 4]);
        assert_eq!(bucket.len(), 3);

        bucket.clear();
        assert!(bucket.is_empty());
        assert_eq!(bucket.count_of(CommandKind::BindFrameBuffer), 0);
    }
}
