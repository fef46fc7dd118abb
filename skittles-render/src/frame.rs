use glam::{Mat4, Vec3};
use skittles_shared::uniforms::{FrameUniforms, ObjectUniforms, MAX_DIR_LIGHTS};

/// A directional light, already resolved to a world-space travel direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Per-frame camera and lighting state handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub ambient: [f32; 3],
    pub lights: Vec<DirectionalLight>,
}

/// One mesh instance to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    /// Handle returned by `ForwardRenderer::upload_mesh`.
    pub mesh: u64,
    pub model: Mat4,
    /// Bounding radius of the mesh in its local space.
    pub bounding_radius: f32,
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
}

impl FrameView {
    pub fn to_uniforms(&self) -> FrameUniforms {
        let mut uniforms = FrameUniforms {
            view_proj: self.view_proj.to_cols_array_2d(),
            camera_pos: self.camera_position.extend(1.0).to_array(),
            ambient: [self.ambient[0], self.ambient[1], self.ambient[2], 1.0],
            light_dirs: [[0.0; 4]; MAX_DIR_LIGHTS],
            light_colors: [[0.0; 4]; MAX_DIR_LIGHTS],
            light_count: [0; 4],
        };

        let count = self.lights.len().min(MAX_DIR_LIGHTS);
        if self.lights.len() > MAX_DIR_LIGHTS {
            log::warn!(
                "{} directional lights requested, only {MAX_DIR_LIGHTS} are shaded",
                self.lights.len()
            );
        }
        for (i, light) in self.lights.iter().take(count).enumerate() {
            uniforms.light_dirs[i] = light.direction.normalize_or_zero().extend(0.0).to_array();
            uniforms.light_colors[i] = [
                light.color[0] * light.intensity,
                light.color[1] * light.intensity,
                light.color[2] * light.intensity,
                1.0,
            ];
        }
        uniforms.light_count[0] = count as u32;
        uniforms
    }
}

impl DrawItem {
    pub fn to_uniforms(&self) -> ObjectUniforms {
        ObjectUniforms {
            model: self.model.to_cols_array_2d(),
            normal_matrix: self.model.inverse().transpose().to_cols_array_2d(),
            base_color: self.base_color,
            material: [self.metalness, self.roughness, self.env_map_intensity, 0.0],
        }
    }

    /// World-space bounding sphere (centre, radius) for frustum culling.
    pub fn world_bounds(&self) -> (Vec3, f32) {
        let (scale, _, translation) = self.model.to_scale_rotation_translation();
        (translation, self.bounding_radius * scale.abs().max_element())
    }
}
