//! # Frame Packet
//!
//! The immutable per-frame snapshot handed from the simulation thread to
//! the render thread. Node arrays live inside one frozen arena buffer;
//! two (or more) packets are in flight at once, indexed by
//! `frame % slot_count`, and a packet's memory is reclaimed two
//! generations later by the exchange protocol.

use std::sync::Arc;

use phosphor_core::{Buffer, StackAllocator, TypedRange};
use tracing::trace;

use super::{CameraNode, DirectionalLightNode, MeshNode, Scene};
use crate::error::{RenderError, RenderResult};

/// Headroom added to the exact node payload when reserving the backing
/// buffer, covering alignment padding between the carved arrays.
const PACKET_SLACK: usize = 64;

/// An immutable snapshot of the scene state relevant to one frame.
///
/// Constructed once per simulation tick inside a freshly acquired tagged
/// buffer, readable by the render thread after publication, destroyed
/// implicitly when its backing slot is freed two generations later.
#[derive(Debug)]
pub struct FramePacket {
    /// Frozen backing storage; the pool holds the twin reference.
    buffer: Arc<Buffer>,
    /// The active camera for this packet's primary pass.
    camera: CameraNode,
    /// Mesh nodes, sorted by `(pass_num, material_id)` for batching.
    meshes: TypedRange<MeshNode>,
    /// Directional lights, in authoring order.
    lights: TypedRange<DirectionalLightNode>,
    /// Frame index this packet was built for.
    frame: u64,
}

impl FramePacket {
    /// Snapshots `scene` into a packet backed by `alloc`'s arena slot.
    ///
    /// The camera is the scene camera whose `pass_num` equals
    /// `primary_pass`; its absence is a configuration error. Mesh nodes
    /// are copied and sorted by `(pass_num, material_id)` - the
    /// once-per-frame sort that lets the pass walk skip redundant
    /// material binds. All node storage is carved from a single pool
    /// acquisition.
    pub fn snapshot(
        scene: &Scene,
        primary_pass: u32,
        mut alloc: StackAllocator,
        frame: u64,
    ) -> RenderResult<Self> {
        let camera = *scene
            .camera_for_pass(primary_pass)
            .ok_or(RenderError::CameraMissing { pass: primary_pass })?;

        let mesh_count = scene.mesh_nodes().len();
        let light_count = scene.light_nodes().len();
        let payload = mesh_count * std::mem::size_of::<MeshNode>()
            + light_count * std::mem::size_of::<DirectionalLightNode>();
        alloc.reserve(payload + PACKET_SLACK);

        let meshes = alloc.alloc_slice::<MeshNode>(mesh_count)?;
        {
            let dst = alloc.write(meshes)?;
            dst.copy_from_slice(scene.mesh_nodes());
            dst.sort_by_key(|m| (m.pass_num, m.material_id));
        }

        let lights = alloc.alloc_slice::<DirectionalLightNode>(light_count)?;
        alloc.write(lights)?.copy_from_slice(scene.light_nodes());

        let buffer = alloc.finish()?;
        trace!(
            frame,
            mesh_count,
            light_count,
            bytes = buffer.size(),
            "frame packet snapshot"
        );

        Ok(Self {
            buffer,
            camera,
            meshes,
            lights,
            frame,
        })
    }

    /// The active camera for this packet.
    #[inline]
    #[must_use]
    pub fn camera(&self) -> &CameraNode {
        &self.camera
    }

    /// Mesh nodes, sorted by `(pass_num, material_id)`.
    #[inline]
    #[must_use]
    pub fn mesh_nodes(&self) -> &[MeshNode] {
        self.buffer.slice(self.meshes)
    }

    /// Directional lights.
    #[inline]
    #[must_use]
    pub fn lights(&self) -> &[DirectionalLightNode] {
        self.buffer.slice(self.lights)
    }

    /// Frame index this packet was built for.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
