//! The whole demo as one owned context: scene, physics, and the per-frame loop body.
//!
//! Everything here is platform independent; the browser glue in `app` only
//! feeds timestamps, sizes and pointer events in and hands draw lists to the
//! renderer.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use skittles_render::{DrawItem, FrameView, Viewport};
use skittles_shared::math::{aspect_ratio, hex_color};

use crate::clock::Clock;
use crate::config::DemoConfig;
use crate::controls::OrbitControls;
use crate::factory::{BodyFactory, ShapeClass};
use crate::impulse::OneShotImpulse;
use crate::input::InputState;
use crate::physics::{BodyDesc, BodyShape, ContactMaterial, PhysicsWorld};
use crate::registry::{SyncPair, SyncRegistry};
use crate::scene::{
    AmbientLight, DirLight, GeometryKind, MeshNode, PerspectiveCamera, SceneGraph,
    StandardMaterial, TransformState,
};
use crate::sound::{AudioCue, HitSound};

const FLOOR_SIZE: (f32, f32) = (100.0, 10.0);
const FLOOR_CENTER_X: f32 = 40.0;
const FLOOR_COLOR: &str = "#777777";

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub delta: f64,
    pub sub_steps: u32,
    pub camera_moved: bool,
}

pub struct Demo {
    pub config: DemoConfig,
    pub scene: SceneGraph,
    pub physics: PhysicsWorld,
    pub registry: SyncRegistry,
    pub factory: BodyFactory,
    pub hit_sound: HitSound,
    pub impulse: OneShotImpulse,
    pub clock: Clock,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub input: InputState,
    pub viewport: Viewport,
}

impl Demo {
    /// Build an empty world: ground, floor, lights and camera, no bodies yet.
    pub fn new(
        config: DemoConfig,
        cue: Box<dyn AudioCue>,
        css_width: u32,
        css_height: u32,
        device_pixel_ratio: f64,
    ) -> Self {
        let mut physics = PhysicsWorld::new(
            Vec3::from_array(config.physics.gravity),
            config.physics.allow_sleep,
        );
        physics.set_contact_material(ContactMaterial {
            name: "default".to_string(),
            friction: config.physics.friction,
            restitution: config.physics.restitution,
        });
        physics.add_body(&BodyDesc {
            mass: 0.0,
            shape: BodyShape::Ground,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });

        let mut scene = SceneGraph::new();
        let floor_geometry = scene.add_geometry(GeometryKind::Plane {
            width: FLOOR_SIZE.0,
            height: FLOOR_SIZE.1,
        });
        let floor_material = scene.add_material(StandardMaterial {
            color: hex_color(FLOOR_COLOR),
            metalness: 0.3,
            roughness: 0.4,
            env_map_intensity: 0.5,
        });
        scene.add(MeshNode {
            geometry: floor_geometry,
            material: floor_material,
            transform: TransformState {
                position: Vec3::new(FLOOR_CENTER_X, 0.0, 0.0),
                rotation: Quat::from_rotation_x(-FRAC_PI_2),
                scale: Vec3::ONE,
            },
        });

        scene.ambient = Some(AmbientLight {
            color: [1.0; 3],
            intensity: 0.7,
        });
        for (position, intensity) in [
            (Vec3::new(10.0, 5.0, 5.0), 0.2),
            (Vec3::new(250.0, 1.0, -10.0), 0.1),
        ] {
            scene.dir_lights.push(DirLight {
                position,
                target: Vec3::ZERO,
                color: [1.0; 3],
                intensity,
            });
        }

        let [segments_w, segments_h] = config.bodies.sphere_segments;
        let sphere = ShapeClass {
            geometry: scene.add_geometry(GeometryKind::Sphere {
                width_segments: segments_w,
                height_segments: segments_h,
            }),
            material: scene.add_material(StandardMaterial {
                color: [1.0; 4],
                metalness: 0.3,
                roughness: 0.4,
                env_map_intensity: 1.0,
            }),
            mass: config.bodies.sphere_mass,
        };
        let cuboid = ShapeClass {
            geometry: scene.add_geometry(GeometryKind::Cuboid),
            material: scene.add_material(StandardMaterial {
                color: [1.0; 4],
                metalness: 0.3,
                roughness: 0.4,
                env_map_intensity: 0.5,
            }),
            mass: config.bodies.box_mass,
        };

        let viewport = Viewport::new(
            css_width,
            css_height,
            device_pixel_ratio,
            config.display.max_pixel_ratio,
        );
        let cam = &config.camera;
        let mut camera = PerspectiveCamera::new(
            cam.fov_degrees,
            aspect_ratio(css_width, css_height),
            cam.near,
            cam.far,
        );
        camera.position = Vec3::from_array(cam.position);
        camera.target = Vec3::from_array(cam.target);
        let controls = OrbitControls::new(camera.target, &config.controls);

        let hit_sound = HitSound::new(cue, config.sound.hit_threshold, config.sound.seed);
        let impulse = OneShotImpulse::new(
            Vec3::from_array(config.impulse.force),
            Vec3::from_array(config.impulse.point),
        );

        Self {
            config,
            scene,
            physics,
            registry: SyncRegistry::new(),
            factory: BodyFactory::new(sphere, cuboid),
            hit_sound,
            impulse,
            clock: Clock::new(),
            camera,
            controls,
            input: InputState::new(),
            viewport,
        }
    }

    /// Spawn a sphere; the first one becomes the impulse target.
    pub fn spawn_sphere(&mut self, radius: f32, position: Vec3) -> SyncPair {
        let pair = self.factory.create_sphere(
            &mut self.scene,
            &mut self.physics,
            &mut self.registry,
            radius,
            position,
        );
        self.impulse.designate(pair.body);
        pair
    }

    pub fn spawn_box(&mut self, width: f32, height: f32, depth: f32, position: Vec3) -> SyncPair {
        self.factory.create_box(
            &mut self.scene,
            &mut self.physics,
            &mut self.registry,
            width,
            height,
            depth,
            position,
        )
    }

    /// Spawn the ball and the rows of pins from the layout settings.
    pub fn populate(&mut self) {
        let layout = self.config.layout.clone();
        self.spawn_sphere(layout.sphere_radius, Vec3::from_array(layout.sphere_position));

        let [w, h, d] = layout.pin_size;
        for &z in &layout.row_offsets_z {
            for i in 0..layout.pins_per_row {
                let x = layout.row_start_x + i as f32 * layout.pin_spacing;
                self.spawn_box(w, h, d, Vec3::new(x, layout.pin_height, z));
            }
        }
        log::info!(
            "Scene populated: {} synced bodies, {} meshes",
            self.registry.len(),
            self.scene.num_meshes()
        );
    }

    /// One loop iteration up to (not including) rendering.
    pub fn tick(&mut self, now_ms: f64) -> FrameReport {
        let delta = self.clock.tick(now_ms);
        let physics = &self.config.physics;
        let sub_steps = self.physics.step(
            physics.fixed_timestep,
            delta,
            physics.max_sub_steps,
            &mut self.hit_sound,
        );
        self.registry.sync_all(&self.physics, &mut self.scene);

        let pointer = self.input.take();
        self.controls
            .handle_input(pointer, self.viewport.css_height as f32);
        let camera_moved = self.controls.update(&mut self.camera);

        FrameReport {
            delta,
            sub_steps,
            camera_moved,
        }
    }

    /// Apply a new canvas size and device pixel ratio.
    pub fn resize(&mut self, css_width: u32, css_height: u32, device_pixel_ratio: f64) {
        self.camera.set_aspect(aspect_ratio(css_width, css_height));
        self.camera.update_projection();
        self.viewport.set_size(css_width, css_height);
        self.viewport.set_pixel_ratio(device_pixel_ratio);
        log::debug!(
            "Resized to {css_width}x{css_height} @ {}x",
            self.viewport.pixel_ratio
        );
    }

    /// Fire the one-shot impulse. Returns false if it already fired.
    pub fn press_play(&mut self) -> bool {
        self.impulse.trigger(&mut self.physics)
    }

    pub fn frame_view(&self) -> FrameView {
        self.scene.frame_view(&self.camera)
    }

    pub fn draw_items(&self, uploaded: &[u64]) -> Vec<DrawItem> {
        self.scene.draw_items(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SilentCue;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct CountingCue {
        plays: Rc<Cell<u32>>,
    }

    impl AudioCue for CountingCue {
        fn set_volume(&mut self, _volume: f64) {}
        fn set_current_time(&mut self, _seconds: f64) {}
        fn play(&mut self) -> Result<(), String> {
            self.plays.set(self.plays.get() + 1);
            Ok(())
        }
    }

    fn stock_demo() -> Demo {
        init_logger();
        let mut demo = Demo::new(DemoConfig::default(), Box::new(SilentCue), 1024, 768, 1.0);
        demo.populate();
        demo
    }

    /// Drive the loop at 60 fps starting from `start_ms`.
    fn run_frames(demo: &mut Demo, start_ms: f64, frames: u32) -> f64 {
        let mut now = start_ms;
        for _ in 0..frames {
            demo.tick(now);
            now += 1000.0 / 60.0;
        }
        now
    }

    #[test]
    fn test_stock_scene_layout() {
        let demo = stock_demo();
        // one ball plus five rows of twenty pins
        assert_eq!(demo.registry.len(), 101);
        // ground plus every synced body
        assert_eq!(demo.physics.body_count(), 102);
        // floor mesh is not synced
        assert_eq!(demo.scene.num_meshes(), 102);
        assert_eq!(demo.impulse.target(), demo.registry.iter().next().map(|p| p.body));
        assert!((demo.camera.aspect - 1024.0 / 768.0).abs() < 1e-6);
    }

    #[test]
    fn test_meshes_follow_bodies_after_frames() {
        let mut demo = stock_demo();
        run_frames(&mut demo, 0.0, 45);

        for pair in demo.registry.iter() {
            let node = demo.scene.mesh(pair.mesh).unwrap();
            assert_eq!(Some(node.transform.position), demo.physics.position(pair.body));
            assert_eq!(Some(node.transform.rotation), demo.physics.rotation(pair.body));
        }
        // pins started at 0.7 and have fallen onto the ground
        let pin = demo.registry.iter().nth(1).unwrap();
        assert!(demo.physics.position(pin.body).unwrap().y < 0.7);
    }

    #[test]
    fn test_first_tick_steps_once_then_large_delta_is_capped() {
        let mut demo = stock_demo();
        let first = demo.tick(5_000.0);
        assert_eq!(first.delta, 0.0);
        assert_eq!(first.sub_steps, 1);

        let late = demo.tick(5_100.0);
        assert!((late.delta - 0.1).abs() < 1e-9);
        assert_eq!(late.sub_steps, 3);
    }

    #[test]
    fn test_falling_pins_trigger_hit_sound() {
        init_logger();
        let plays = Rc::new(Cell::new(0));
        let cue = CountingCue {
            plays: Rc::clone(&plays),
        };
        let mut demo = Demo::new(DemoConfig::default(), Box::new(cue), 800, 600, 1.0);
        demo.populate();

        run_frames(&mut demo, 0.0, 60);
        assert!(plays.get() > 0, "no hit sound after pins landed");
    }

    #[test]
    fn test_resize_updates_camera_and_viewport() {
        let mut demo = stock_demo();
        demo.resize(800, 600, 3.0);
        assert!((demo.camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(
            (demo.viewport.css_width, demo.viewport.css_height),
            (800, 600)
        );
        assert_eq!(demo.viewport.pixel_ratio, 2.0);

        let expected = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 100.0).projection;
        assert!(demo.camera.projection.abs_diff_eq(expected, 1e-6));

        demo.resize(800, 600, 1.5);
        assert_eq!(demo.viewport.pixel_ratio, 1.5);
    }

    #[test]
    fn test_play_on_first_frame_launches_ball() {
        let mut demo = stock_demo();
        let ball = demo.impulse.target().unwrap();
        let start = demo.physics.position(ball).unwrap();
        assert!((start.y - demo.config.layout.sphere_radius).abs() < 1e-6);

        assert!(demo.press_play());
        demo.tick(0.0);
        let vx = demo.physics.linear_velocity(ball).unwrap().x;
        // 5000 N on 2 kg for one 1/60 s step
        assert!(vx > 30.0, "ball should be launched, vx {vx}");

        assert!(!demo.press_play());
        assert!(demo.impulse.fired());
    }

    #[test]
    fn test_play_after_ball_settles_launches_ball() {
        let mut demo = stock_demo();
        let ball = demo.impulse.target().unwrap();
        let now = run_frames(&mut demo, 0.0, 240);
        let resting = demo.physics.linear_velocity(ball).unwrap();
        assert!(resting.length() < 0.5, "ball should be at rest, v {resting}");

        assert!(demo.press_play());
        demo.tick(now);
        let vx = demo.physics.linear_velocity(ball).unwrap().x;
        assert!(vx > 30.0, "ball should be launched, vx {vx}");
        assert!(!demo.press_play());
    }

    #[test]
    fn test_hundred_extra_boxes() {
        let mut demo = stock_demo();
        let before = demo.registry.len();
        for i in 0..100 {
            demo.spawn_box(0.25, 0.5, 1.0, Vec3::new(i as f32, 5.0, 4.0));
        }
        assert_eq!(demo.registry.len(), before + 100);
        let bodies: HashSet<_> = demo.registry.iter().map(|p| p.body).collect();
        assert_eq!(bodies.len(), demo.registry.len());
    }

    #[test]
    fn test_later_spheres_do_not_rebind_impulse() {
        let mut demo = stock_demo();
        let first = demo.impulse.target();
        demo.spawn_sphere(0.5, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(demo.impulse.target(), first);
    }

    #[test]
    fn test_drag_orbits_camera() {
        let mut demo = stock_demo();
        let distance = demo.camera.position.length();
        demo.tick(0.0);

        demo.input.pointer_down(0, 100.0, 100.0);
        demo.input.pointer_move(180.0, 100.0);
        let report = demo.tick(16.0);
        assert!(report.camera_moved);
        assert!((demo.camera.position.length() - distance).abs() < 1e-3);
    }

    #[test]
    fn test_draw_items_cover_every_mesh_once_uploaded() {
        let demo = stock_demo();
        let uploaded: Vec<u64> = (1..=demo.scene.geometries.len() as u64).collect();
        assert_eq!(demo.draw_items(&uploaded).len(), demo.scene.num_meshes());
        assert_eq!(demo.frame_view().lights.len(), 2);
    }
}
