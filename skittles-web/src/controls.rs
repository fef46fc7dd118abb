use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::config::ControlSettings;
use crate::input::PointerDelta;
use crate::scene::PerspectiveCamera;

const MIN_POLAR: f32 = 1e-4;

/// Spherical offset from the orbit target. `phi` is measured from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(
            s * self.theta.sin(),
            self.phi.cos() * self.radius,
            s * self.theta.cos(),
        )
    }
}

/// Damped orbit camera around a fixed target.
///
/// Pointer input queues rotation/zoom; `update` applies a `damping_factor`
/// share of the queue each frame, so motion eases out after input stops.
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3, settings: &ControlSettings) -> Self {
        Self {
            target,
            enable_damping: settings.enable_damping,
            damping_factor: settings.damping_factor,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// `factor > 1` moves the camera away from the target.
    pub fn dolly(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Translate a frame's pointer input. A full canvas-height drag is one turn.
    pub fn handle_input(&mut self, delta: PointerDelta, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(TAU * delta.dx as f32 / height * self.rotate_speed);
        self.rotate_up(TAU * delta.dy as f32 / height * self.rotate_speed);
        if delta.wheel != 0.0 {
            let step = 0.95_f32.powf(self.zoom_speed);
            self.dolly(if delta.wheel > 0.0 { 1.0 / step } else { step });
        }
    }

    /// Pending rotation not yet applied to the camera.
    pub fn pending_rotation(&self) -> f32 {
        self.delta_theta.abs() + self.delta_phi.abs()
    }

    /// Move the camera by the queued input. Returns true if it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * share;
        spherical.phi += self.delta_phi * share;
        spherical.phi = spherical.phi.clamp(MIN_POLAR, PI - MIN_POLAR);
        spherical.radius =
            (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let position = self.target + spherical.to_offset();
        let moved = position.distance_squared(camera.position) > 1e-10;
        camera.position = position;
        camera.target = self.target;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
        moved
    }
}
