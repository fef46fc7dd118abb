//! GPU uniform layouts. Field order and padding must match `shaders/forward.wgsl`.

use bytemuck::{Pod, Zeroable};

/// Directional lights the forward shader evaluates per fragment.
pub const MAX_DIR_LIGHTS: usize = 4;

/// Bound once per frame at group 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera world position, w unused
    pub camera_pos: [f32; 4],
    /// rgb = ambient colour * intensity, a unused
    pub ambient: [f32; 4],
    /// xyz = direction the light travels (towards the scene), w unused
    pub light_dirs: [[f32; 4]; MAX_DIR_LIGHTS],
    /// rgb = colour * intensity
    pub light_colors: [[f32; 4]; MAX_DIR_LIGHTS],
    /// x = active light count
    pub light_count: [u32; 4],
}

/// Bound per draw at group 1 with a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, upper 3x3 used.
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// x = metalness, y = roughness, z = environment intensity, w unused
    pub material: [f32; 4],
}
