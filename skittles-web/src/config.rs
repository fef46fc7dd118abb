//! Scene tunables, loaded from an optional TOML document supplied by the host page.

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Complete demo configuration. Every section falls back to the stock scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub physics: PhysicsSettings,
    pub bodies: BodySettings,
    pub layout: LayoutSettings,
    pub sound: SoundSettings,
    pub impulse: ImpulseSettings,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub display: DisplaySettings,
    pub assets: AssetSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: [f32; 3],
    /// Fixed internal timestep in seconds.
    pub fixed_timestep: f64,
    /// Maximum internal steps per frame before simulated time is dropped.
    pub max_sub_steps: u32,
    pub friction: f32,
    pub restitution: f32,
    pub allow_sleep: bool,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
            fixed_timestep: 1.0 / 60.0,
            max_sub_steps: 3,
            friction: 0.1,
            restitution: 0.7,
            allow_sleep: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySettings {
    pub sphere_mass: f32,
    pub box_mass: f32,
    pub sphere_segments: [u32; 2],
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            sphere_mass: 2.0,
            box_mass: 0.5,
            sphere_segments: [20, 20],
        }
    }
}

/// Ball spawn and the rows of pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub sphere_radius: f32,
    /// Ball spawn point. The default rests the ball on the floor; a ball
    /// buried in the ground would have a launch force absorbed by the contact.
    pub sphere_position: [f32; 3],
    /// Pin width, height, depth.
    pub pin_size: [f32; 3],
    pub pins_per_row: u32,
    pub row_start_x: f32,
    pub pin_spacing: f32,
    pub pin_height: f32,
    pub row_offsets_z: Vec<f32>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            sphere_radius: 0.25,
            sphere_position: [0.0, 0.25, 0.0],
            pin_size: [0.25, 0.5, 1.0],
            pins_per_row: 20,
            row_start_x: 10.0,
            pin_spacing: 1.0,
            pin_height: 0.7,
            row_offsets_z: vec![0.0, 1.1, 2.2, -1.1, -2.2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Impact speed along the contact normal above which the hit cue plays.
    pub hit_threshold: f32,
    pub seed: u32,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            hit_threshold: 1.5,
            seed: 0x9e37_79b9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseSettings {
    /// Force in the target body's local frame.
    pub force: [f32; 3],
    /// Application point in the target body's local frame.
    pub point: [f32; 3],
}

impl Default for ImpulseSettings {
    fn default() -> Self {
        Self {
            force: [5000.0, 0.0, 0.0],
            point: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [-3.0, 2.0, -0.1],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub max_pixel_ratio: f64,
    pub clear_color: [f64; 3],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

/// Host page element ids and static asset paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub hit_sound: String,
    pub play_button_id: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            hit_sound: "/sounds/hit.mp3".to_string(),
            play_button_id: "playButton".to_string(),
        }
    }
}

impl DemoConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(source: &str) -> anyhow::Result<Self> {
        let config: DemoConfig = toml::from_str(source).context("invalid demo configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let physics = &self.physics;
        ensure!(
            physics.fixed_timestep > 0.0 && physics.fixed_timestep.is_finite(),
            "physics.fixed_timestep must be > 0 (got {})",
            physics.fixed_timestep
        );
        ensure!(physics.max_sub_steps >= 1, "physics.max_sub_steps must be >= 1");
        ensure!(
            self.bodies.sphere_mass >= 0.0 && self.bodies.box_mass >= 0.0,
            "body masses must be >= 0"
        );
        ensure!(self.layout.sphere_radius > 0.0, "layout.sphere_radius must be > 0");
        ensure!(
            self.layout.pin_size.iter().all(|&d| d > 0.0),
            "layout.pin_size dimensions must be > 0"
        );
        ensure!(self.sound.hit_threshold >= 0.0, "sound.hit_threshold must be >= 0");
        ensure!(
            self.camera.near > 0.0 && self.camera.far > self.camera.near,
            "camera requires 0 < near < far"
        );
        ensure!(
            (0.0..=1.0).contains(&self.controls.damping_factor),
            "controls.damping_factor must be within [0, 1]"
        );
        ensure!(self.display.max_pixel_ratio >= 1.0, "display.max_pixel_ratio must be >= 1");
        Ok(())
    }
}
