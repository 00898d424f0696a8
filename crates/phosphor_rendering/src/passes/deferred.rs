//! # Deferred Pipeline
//!
//! The ordered pass sequence that turns a frame packet into a command
//! bucket:
//!
//! ```text
//! Pass 0  G-buffer   depth on,  blend off  mesh nodes with pass_num == 0
//! Pass 1  Lights     depth off, additive   one quad per light + ambient
//! Pass 2  Composite  depth off, blend off  one quad to the backbuffer
//! ```
//!
//! Passes are configured once at construction and replayed identically
//! every frame.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::command::{BlendMode, CommandBucket, BACKBUFFER, CLEAR_COLOR, CLEAR_DEPTH};
use crate::math::{euler_direction, model_matrix};
use crate::resources::{BuiltinUniform, ResourceProvider};
use crate::scene::FramePacket;

/// Declarative description of one render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPassDesc {
    /// Target framebuffer id; [`BACKBUFFER`] for the default target.
    pub framebuffer: u32,
    /// Attachments cleared at pass start (may be 0 for none).
    pub clear_mask: u32,
    /// Clear color, RGBA.
    pub clear_color: [f32; 4],
    /// Whether depth testing is enabled for the pass.
    pub depth_test: bool,
    /// Blend mode for the pass.
    pub blend: BlendMode,
    /// Lighting pass: iterate every light with a fullscreen quad each.
    pub lighting: bool,
    /// Fullscreen pass: draw one quad with this material instead of
    /// walking mesh nodes.
    pub fullscreen_material: Option<u32>,
}

/// Opaque resource ids wired into the fixed pass sequence.
///
/// Loaded once at startup; ids are resolved by the external resource
/// manager before the pipeline is built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// G-buffer framebuffer (albedo + normal + depth attachments).
    pub gbuffer_framebuffer: u32,
    /// Light accumulation framebuffer.
    pub light_framebuffer: u32,
    /// Fullscreen quad mesh.
    pub quad_mesh: u32,
    /// Material of the per-light accumulation quad.
    pub light_material: u32,
    /// Material of the ambient-term quad.
    pub ambient_material: u32,
    /// Material of the final composite quad.
    pub composite_material: u32,
    /// Clear color of the G-buffer pass.
    pub clear_color: [f32; 4],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gbuffer_framebuffer: 0,
            light_framebuffer: 1,
            quad_mesh: 0,
            light_material: 100,
            ambient_material: 101,
            composite_material: 102,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// The fixed deferred pass sequence.
///
/// Walks a frame packet's nodes and emits commands into a bucket; never
/// touches the graphics API itself.
pub struct DeferredPipeline {
    passes: Vec<RenderPassDesc>,
    config: PipelineConfig,
}

impl DeferredPipeline {
    /// Builds the standard three-pass deferred sequence.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let passes = vec![
            // G-buffer: geometry into MRT attachments.
            RenderPassDesc {
                framebuffer: config.gbuffer_framebuffer,
                clear_mask: CLEAR_COLOR | CLEAR_DEPTH,
                clear_color: config.clear_color,
                depth_test: true,
                blend: BlendMode::Opaque,
                lighting: false,
                fullscreen_material: None,
            },
            // Light accumulation: additive quad per light, plus ambient.
            RenderPassDesc {
                framebuffer: config.light_framebuffer,
                clear_mask: CLEAR_COLOR,
                clear_color: [0.0, 0.0, 0.0, 1.0],
                depth_test: false,
                blend: BlendMode::Additive,
                lighting: true,
                fullscreen_material: None,
            },
            // Albedo composite to the backbuffer.
            RenderPassDesc {
                framebuffer: BACKBUFFER,
                clear_mask: CLEAR_COLOR,
                clear_color: [0.0, 0.0, 0.0, 1.0],
                depth_test: false,
                blend: BlendMode::Opaque,
                lighting: false,
                fullscreen_material: Some(config.composite_material),
            },
        ];
        Self { passes, config }
    }

    /// Builds a pipeline from a custom pass list (tests, variants).
    #[must_use]
    pub fn from_passes(config: PipelineConfig, passes: Vec<RenderPassDesc>) -> Self {
        Self { passes, config }
    }

    /// The configured passes, in execution order.
    #[must_use]
    pub fn passes(&self) -> &[RenderPassDesc] {
        &self.passes
    }

    /// Emits one frame's commands for the whole pass sequence.
    pub fn execute(
        &self,
        packet: &FramePacket,
        resources: &impl ResourceProvider,
        bucket: &mut CommandBucket,
    ) {
        for index in 0..self.passes.len() {
            self.execute_pass(index, packet, resources, bucket);
        }
        trace!(
            frame = packet.frame(),
            commands = bucket.len(),
            "pipeline executed"
        );
    }

    /// Emits one pass's commands.
    ///
    /// Exposed for pass-level testing; `index` is the pass's position in
    /// the configured sequence and the `pass_num` mesh nodes are filtered
    /// against.
    pub fn execute_pass(
        &self,
        index: usize,
        packet: &FramePacket,
        resources: &impl ResourceProvider,
        bucket: &mut CommandBucket,
    ) {
        let desc = &self.passes[index];

        bucket.bind_framebuffer(desc.framebuffer);
        bucket.set_depth_test(desc.depth_test);
        bucket.set_blend_mode(desc.blend);

        let camera = packet.camera();
        let [vx, vy, vw, vh] = camera.viewport;
        bucket.set_viewport(vx as i32, vy as i32, vw as u32, vh as u32);

        if desc.clear_mask != 0 {
            bucket.clear_framebuffer(desc.clear_mask, desc.clear_color);
        }

        if desc.lighting {
            self.emit_light_quads(packet, resources, bucket);
        } else if let Some(material) = desc.fullscreen_material {
            self.emit_fullscreen_quad(material, resources, bucket);
        } else {
            self.emit_mesh_nodes(index as u32, packet, resources, bucket);
        }
    }

    /// Geometry walk: every mesh node whose `pass_num` matches the pass.
    ///
    /// Nodes arrive sorted by `(pass_num, material_id)`, so the
    /// last-bound-material check collapses consecutive same-material
    /// nodes into a single program/texture bind.
    fn emit_mesh_nodes(
        &self,
        pass_num: u32,
        packet: &FramePacket,
        resources: &impl ResourceProvider,
        bucket: &mut CommandBucket,
    ) {
        let camera = packet.camera();
        let view = camera.view_matrix().to_cols_array_2d();
        let projection = camera.projection_matrix().to_cols_array_2d();

        let mut bound_material: Option<u32> = None;
        let mut program = 0u32;

        for node in packet
            .mesh_nodes()
            .iter()
            .filter(|m| m.pass_num == pass_num)
        {
            if bound_material != Some(node.material_id) {
                program = resources.program_for_material(node.material_id);
                bucket.bind_program(program);
                for binding in resources.texture_bindings(node.material_id) {
                    bucket.bind_texture(binding.texture, binding.unit, binding.location);
                }
                bound_material = Some(node.material_id);
            }

            bucket.bind_uniform_mat4(
                resources.uniform_location(program, BuiltinUniform::Model),
                model_matrix(&node.transform).to_cols_array_2d(),
            );
            bucket.bind_uniform_mat4(
                resources.uniform_location(program, BuiltinUniform::View),
                view,
            );
            bucket.bind_uniform_mat4(
                resources.uniform_location(program, BuiltinUniform::Projection),
                projection,
            );
            bucket.bind_mesh(node.mesh_id);
            bucket.draw_elements(resources.mesh_index_count(node.mesh_id));
        }
    }

    /// Light accumulation: one fullscreen quad per directional light with
    /// that light's terms bound, then one ambient quad, then blending
    /// back off. View-space reconstruction uses the G-buffer camera.
    fn emit_light_quads(
        &self,
        packet: &FramePacket,
        resources: &impl ResourceProvider,
        bucket: &mut CommandBucket,
    ) {
        let camera = packet.camera();
        let view = camera.view_matrix().to_cols_array_2d();
        let projection = camera.projection_matrix().to_cols_array_2d();
        let quad_indices = resources.mesh_index_count(self.config.quad_mesh);

        let program = resources.program_for_material(self.config.light_material);
        bucket.bind_program(program);
        for binding in resources.texture_bindings(self.config.light_material) {
            bucket.bind_texture(binding.texture, binding.unit, binding.location);
        }

        for light in packet.lights() {
            bucket.bind_uniform_vec3(
                resources.uniform_location(program, BuiltinUniform::LightDirection),
                euler_direction(light.transform.rotation),
            );
            bucket.bind_uniform_vec3(
                resources.uniform_location(program, BuiltinUniform::LightDiffuse),
                light.diffuse,
            );
            bucket.bind_uniform_vec3(
                resources.uniform_location(program, BuiltinUniform::LightSpecular),
                light.specular,
            );
            bucket.bind_uniform_mat4(
                resources.uniform_location(program, BuiltinUniform::View),
                view,
            );
            bucket.bind_uniform_mat4(
                resources.uniform_location(program, BuiltinUniform::Projection),
                projection,
            );
            bucket.bind_mesh(self.config.quad_mesh);
            bucket.draw_elements(quad_indices);
        }

        // Ambient term: one more quad, no light-specific uniforms.
        self.emit_fullscreen_quad(self.config.ambient_material, resources, bucket);

        bucket.set_blend_mode(BlendMode::Opaque);
    }

    /// One fullscreen quad with the given material.
    fn emit_fullscreen_quad(
        &self,
        material: u32,
        resources: &impl ResourceProvider,
        bucket: &mut CommandBucket,
    ) {
        let program = resources.program_for_material(material);
        bucket.bind_program(program);
        for binding in resources.texture_bindings(material) {
            bucket.bind_texture(binding.texture, binding.unit, binding.location);
        }
        bucket.bind_mesh(self.config.quad_mesh);
        bucket.draw_elements(resources.mesh_index_count(self.config.quad_mesh));
    }
}
