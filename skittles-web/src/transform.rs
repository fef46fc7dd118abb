use glam::Mat4;

use crate::scene::TransformState;

/// Compose a local transform matrix from position, rotation, and scale.
///
/// Mesh nodes have no parents, so the local matrix is also the world matrix.
pub fn model_matrix(transform: &TransformState) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        transform.scale,
        transform.rotation.normalize(),
        transform.position,
    )
}
