//! # Scene Data Model
//!
//! The mutable authoring-side scene graph and the node types that flow
//! into frame packets.
//!
//! Node structs are `#[repr(C)]` + `Pod` so packets can carve them
//! straight out of arena bytes; the authoring `Scene` itself is plain
//! heap-backed and long-lived.

mod packet;

pub use packet::FramePacket;

use bytemuck::{Pod, Zeroable};

/// Position, Euler rotation (radians) and per-axis scale of a node.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Transform {
    /// World-space position.
    pub position: [f32; 3],
    /// Intrinsic X→Y→Z Euler angles, radians.
    pub rotation: [f32; 3],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Transform {
    /// Identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0; 3],
        scale: [1.0; 3],
    };

    /// Creates a transform at `position` with no rotation and unit scale.
    #[must_use]
    pub const fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A renderable mesh instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshNode {
    /// Spatial transform.
    pub transform: Transform,
    /// Opaque mesh id resolved by the resource provider.
    pub mesh_id: u32,
    /// Opaque material id resolved by the resource provider.
    pub material_id: u32,
    /// Index of the render pass that consumes this node.
    pub pass_num: u32,
}

/// A directional light.
///
/// The light's direction is its Euler rotation applied to -Z; position
/// and scale are carried for symmetry but do not affect shading.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightNode {
    /// Spatial transform; rotation defines the light direction.
    pub transform: Transform,
    /// Diffuse color term.
    pub diffuse: [f32; 3],
    /// Specular color term.
    pub specular: [f32; 3],
    /// Index of the render pass that consumes this node.
    pub pass_num: u32,
}

/// Projection parameters of a camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view, radians.
        fov_y: f32,
        /// Width / height.
        aspect: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half extent along X.
        half_width: f32,
        /// Half extent along Y.
        half_height: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fov_y: std::f32::consts::FRAC_PI_3,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// The camera for one render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraNode {
    /// Camera transform; the view matrix is its inverse rigid motion.
    pub transform: Transform,
    /// Viewport rectangle `[x, y, width, height]` in pixels.
    pub viewport: [f32; 4],
    /// Projection parameters.
    pub projection: Projection,
    /// Index of the render pass this camera drives.
    pub pass_num: u32,
}

impl CameraNode {
    /// View matrix: inverse of the camera's rigid motion.
    #[must_use]
    pub fn view_matrix(&self) -> glam::Mat4 {
        crate::math::view_matrix(&self.transform)
    }

    /// Projection matrix from the camera's parameters.
    #[must_use]
    pub fn projection_matrix(&self) -> glam::Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => glam::Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => glam::Mat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }
}

impl Default for CameraNode {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            viewport: [0.0, 0.0, 1280.0, 720.0],
            projection: Projection::default(),
            pass_num: 0,
        }
    }
}

/// The mutable authoring-side scene graph.
///
/// Long-lived and mutated in place by simulation every tick; nodes are
/// appended and updated, never removed on the hot path.
#[derive(Default)]
pub struct Scene {
    mesh_nodes: Vec<MeshNode>,
    camera_nodes: Vec<CameraNode>,
    light_nodes: Vec<DirectionalLightNode>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mesh node, returning its index.
    pub fn add_mesh(&mut self, node: MeshNode) -> usize {
        self.mesh_nodes.push(node);
        self.mesh_nodes.len() - 1
    }

    /// Appends a camera node, returning its index.
    pub fn add_camera(&mut self, node: CameraNode) -> usize {
        self.camera_nodes.push(node);
        self.camera_nodes.len() - 1
    }

    /// Appends a directional light, returning its index.
    pub fn add_light(&mut self, node: DirectionalLightNode) -> usize {
        self.light_nodes.push(node);
        self.light_nodes.len() - 1
    }

    /// The scene's mesh nodes.
    #[must_use]
    pub fn mesh_nodes(&self) -> &[MeshNode] {
        &self.mesh_nodes
    }

    /// Mutable access for simulation updates.
    pub fn mesh_nodes_mut(&mut self) -> &mut [MeshNode] {
        &mut self.mesh_nodes
    }

    /// The scene's camera nodes.
    #[must_use]
    pub fn camera_nodes(&self) -> &[CameraNode] {
        &self.camera_nodes
    }

    /// Mutable access for simulation updates.
    pub fn camera_nodes_mut(&mut self) -> &mut [CameraNode] {
        &mut self.camera_nodes
    }

    /// The scene's directional lights.
    #[must_use]
    pub fn light_nodes(&self) -> &[DirectionalLightNode] {
        &self.light_nodes
    }

    /// Mutable access for simulation updates.
    pub fn light_nodes_mut(&mut self) -> &mut [DirectionalLightNode] {
        &mut self.light_nodes
    }

    /// The camera driving `pass_num`, if one exists.
    #[must_use]
    pub fn camera_for_pass(&self, pass_num: u32) -> Option<&CameraNode> {
        self.camera_nodes.iter().find(|c| c.pass_num == pass_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_layouts_have_no_padding() {
        // Pod derives already guarantee this at compile time; pin the
        // wire sizes so refactors do not silently grow packets.
        assert_eq!(std::mem::size_of::<Transform>(), 36);
        assert_eq!(std::mem::size_of::<MeshNode>(), 48);
        assert_eq!(std::mem::size_of::<DirectionalLightNode>(), 64);
    }

    #[test]
    fn camera_lookup_by_pass() {
        let mut scene = Scene::new();
        scene.add_camera(CameraNode {
            pass_num: 2,
            ..CameraNode::default()
        });

        assert!(scene.camera_for_pass(0).is_none());
        assert_eq!(scene.camera_for_pass(2).unwrap().pass_num, 2);
    }

    #[test]
    fn scene_appends_in_place() {
        let mut scene = Scene::new();
        scene.add_mesh(MeshNode::default());
        scene.add_mesh(MeshNode {
            mesh_id: 7,
            ..MeshNode::default()
        });

        scene.mesh_nodes_mut()[0].transform.position = [1.0, 0.0, 0.0];
        assert_eq!(scene.mesh_nodes()[0].transform.position, [1.0, 0.0, 0.0]);
        assert_eq!(scene.mesh_nodes()[1].mesh_id, 7);
    }
}
