//! Procedural mesh generators for the shape classes the scene draws.
//!
//! All generators emit flat attribute arrays (ready for `bytemuck::cast_slice`)
//! with counter-clockwise front faces.

use glam::Vec3;
use std::f32::consts::PI;

/// CPU-side mesh data ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Radius of the smallest origin-centred sphere containing every vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]).length())
            .fold(0.0, f32::max)
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.positions.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
    }
}

/// UV sphere centred on the origin.
///
/// Produces `(width_segments + 1) * (height_segments + 1)` vertices; the pole
/// rows contribute one triangle per segment, every other row two.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let position = Vec3::new(
                -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            mesh.push_vertex(position, position.normalize_or_zero());
        }
    }

    let stride = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

/// Axis-aligned box centred on the origin with one quad per face (24 vertices, 36 indices).
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let half = Vec3::new(width, height, depth) * 0.5;
    // (normal, tangent, bitangent) with tangent x bitangent == normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut mesh = MeshData::default();
    for (normal, u_axis, v_axis) in faces {
        let base = mesh.vertex_count() as u32;
        let center = normal * half;
        let du = u_axis * half;
        let dv = v_axis * half;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            mesh.push_vertex(center + du * su + dv * sv, normal);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Quad in the XY plane facing +Z.
pub fn plane(width: f32, height: f32) -> MeshData {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let mut mesh = MeshData::default();
    mesh.push_vertex(Vec3::new(-hw, -hh, 0.0), Vec3::Z);
    mesh.push_vertex(Vec3::new(hw, -hh, 0.0), Vec3::Z);
    mesh.push_vertex(Vec3::new(hw, hh, 0.0), Vec3::Z);
    mesh.push_vertex(Vec3::new(-hw, hh, 0.0), Vec3::Z);
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    mesh
}
