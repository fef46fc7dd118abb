use glam::{Mat4, Vec3, Vec4};

/// Extract 6 frustum planes from a view-projection matrix (Gribb-Hartmann method).
/// Each plane is [a, b, c, d] where ax + by + cz + d = 0 (Hessian normal form).
///
/// Assumes a 0..1 clip-space depth range, as produced by `Mat4::perspective_rh`.
pub fn extract_frustum_planes(vp: &Mat4) -> [[f32; 4]; 6] {
    let row0 = Vec4::new(vp.col(0).x, vp.col(1).x, vp.col(2).x, vp.col(3).x);
    let row1 = Vec4::new(vp.col(0).y, vp.col(1).y, vp.col(2).y, vp.col(3).y);
    let row2 = Vec4::new(vp.col(0).z, vp.col(1).z, vp.col(2).z, vp.col(3).z);
    let row3 = Vec4::new(vp.col(0).w, vp.col(1).w, vp.col(2).w, vp.col(3).w);

    let mut planes = [
        (row3 + row0).to_array(), // left
        (row3 - row0).to_array(), // right
        (row3 + row1).to_array(), // bottom
        (row3 - row1).to_array(), // top
        row2.to_array(),          // near
        (row3 - row2).to_array(), // far
    ];

    for plane in &mut planes {
        let len = (plane[0] * plane[0] + plane[1] * plane[1] + plane[2] * plane[2]).sqrt();
        if len > 1e-8 {
            plane[0] /= len;
            plane[1] /= len;
            plane[2] /= len;
            plane[3] /= len;
        }
    }

    planes
}

/// Test if a bounding sphere is inside or intersects the frustum.
pub fn sphere_in_frustum(planes: &[[f32; 4]; 6], center: Vec3, radius: f32) -> bool {
    for plane in planes {
        let dist = plane[0] * center.x + plane[1] * center.y + plane[2] * center.z + plane[3];
        if dist < -radius {
            return false;
        }
    }
    true
}

/// Clamp a device pixel ratio to `max`. Non-finite or non-positive ratios fall back to 1.
pub fn clamp_pixel_ratio(device_pixel_ratio: f64, max: f64) -> f64 {
    if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
        return 1.0;
    }
    device_pixel_ratio.min(max)
}

/// Width / height, guarding against a zero-height surface.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Parse a `#rrggbb` colour into linear-ish RGBA in [0, 1]. Returns white for malformed input.
pub fn hex_color(hex: &str) -> [f32; 4] {
    let digits = hex.trim_start_matches('#');
    match (digits.len(), u32::from_str_radix(digits, 16)) {
        (6, Ok(value)) => [
            ((value >> 16) & 0xff) as f32 / 255.0,
            ((value >> 8) & 0xff) as f32 / 255.0,
            (value & 0xff) as f32 / 255.0,
            1.0,
        ],
        _ => [1.0, 1.0, 1.0, 1.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    // ── extract_frustum_planes ──

    #[test]
    fn test_frustum_planes_normalized() {
        let proj = Mat4::perspective_rh(PI / 4.0, 16.0 / 9.0, 0.1, 100.0);
        let planes = extract_frustum_planes(&proj);
        for plane in &planes {
            let len = (plane[0] * plane[0] + plane[1] * plane[1] + plane[2] * plane[2]).sqrt();
            assert!(approx_eq(len, 1.0), "Plane normal not unit length: {len}");
        }
    }

    // ── sphere_in_frustum ──

    #[test]
    fn test_sphere_inside_frustum() {
        let proj = Mat4::perspective_rh(PI / 4.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let planes = extract_frustum_planes(&(proj * view));
        assert!(sphere_in_frustum(&planes, Vec3::ZERO, 0.5));
    }

    #[test]
    fn test_sphere_behind_camera_culled() {
        let proj = Mat4::perspective_rh(PI / 4.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let planes = extract_frustum_planes(&(proj * view));
        assert!(!sphere_in_frustum(&planes, Vec3::new(0.0, 0.0, 20.0), 1.0));
    }

    #[test]
    fn test_sphere_beyond_far_plane_culled() {
        let proj = Mat4::perspective_rh(PI / 4.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let planes = extract_frustum_planes(&(proj * view));
        assert!(!sphere_in_frustum(&planes, Vec3::new(0.0, 0.0, -200.0), 1.0));
    }

    #[test]
    fn test_sphere_straddling_plane() {
        let proj = Mat4::perspective_rh(PI / 4.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let planes = extract_frustum_planes(&(proj * view));
        assert!(sphere_in_frustum(&planes, Vec3::new(50.0, 0.0, 0.0), 100.0));
    }

    // ── clamp_pixel_ratio ──

    #[test]
    fn test_pixel_ratio_capped() {
        assert_eq!(clamp_pixel_ratio(3.0, 2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(1.5, 2.0), 1.5);
    }

    #[test]
    fn test_pixel_ratio_invalid_falls_back() {
        assert_eq!(clamp_pixel_ratio(0.0, 2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN, 2.0), 1.0);
    }

    #[test]
    fn test_aspect_ratio() {
        assert!(approx_eq(aspect_ratio(800, 600), 800.0 / 600.0));
        assert!(approx_eq(aspect_ratio(800, 0), 1.0));
    }

    #[test]
    fn test_hex_color() {
        let c = hex_color("#777777");
        assert!(approx_eq(c[0], 119.0 / 255.0));
        assert!(approx_eq(c[3], 1.0));
        assert_eq!(hex_color("nope"), [1.0, 1.0, 1.0, 1.0]);
    }
}
