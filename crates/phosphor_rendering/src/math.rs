//! # Matrix Composition
//!
//! The fixed matrix conventions of the pipeline. Node fields stay plain
//! `[f32; 3]` arrays; glam enters only here.

use glam::{Mat3, Mat4, Vec3};

use crate::scene::Transform;

/// Composes the model matrix for a node transform.
///
/// Fixed order: `translate * rotate_z * rotate_y * rotate_x * scale`
/// (intrinsic X→Y→Z Euler rotation, then scale, then translation).
/// This exact composition must be preserved for visual parity; angles are
/// in radians.
#[must_use]
pub fn model_matrix(transform: &Transform) -> Mat4 {
    let [rx, ry, rz] = transform.rotation;
    Mat4::from_translation(Vec3::from_array(transform.position))
        * Mat4::from_rotation_z(rz)
        * Mat4::from_rotation_y(ry)
        * Mat4::from_rotation_x(rx)
        * Mat4::from_scale(Vec3::from_array(transform.scale))
}

/// Composes the view matrix for a camera transform.
///
/// The inverse of the camera's rigid motion (rotation + translation;
/// camera scale is ignored).
#[must_use]
pub fn view_matrix(transform: &Transform) -> Mat4 {
    let [rx, ry, rz] = transform.rotation;
    let world = Mat4::from_translation(Vec3::from_array(transform.position))
        * Mat4::from_rotation_z(rz)
        * Mat4::from_rotation_y(ry)
        * Mat4::from_rotation_x(rx);
    world.inverse()
}

/// Direction a rotated node faces: its Euler rotation applied to -Z.
#[must_use]
pub fn euler_direction(rotation: [f32; 3]) -> [f32; 3] {
    let [rx, ry, rz] = rotation;
    let basis = Mat3::from_rotation_z(rz) * Mat3::from_rotation_y(ry) * Mat3::from_rotation_x(rx);
    (basis * Vec3::NEG_Z).to_array()
}
