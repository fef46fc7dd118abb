//! Rigid-body world backed by rapier3d.
//!
//! Adds the pieces the scene needs on top of the raw pipeline: variable-rate
//! stepping with a fixed internal timestep, collision-start observers with the
//! impact velocity along the contact normal, and one-shot local forces.

use std::collections::HashSet;
use std::sync::Mutex;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

/// Opaque reference to a body owned by [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    /// Infinite ground with its normal along +Y.
    Ground,
}

/// Friction/restitution pairing applied to every collider created after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMaterial {
    pub name: String,
    pub friction: f32,
    pub restitution: f32,
}

/// Construction parameters for one body. `mass == 0` makes the body static.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub mass: f32,
    pub shape: BodyShape,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Collision-start payload delivered to observers, once per subscribed body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub body: BodyHandle,
    pub other: Option<BodyHandle>,
    /// Relative velocity along the contact normal, sampled before the solver
    /// resolves the contact. Positive when the bodies approach.
    pub impact_velocity: f32,
}

/// Receives collision-start events synchronously from [`PhysicsWorld::step`].
pub trait CollisionObserver {
    fn on_collide(&mut self, event: &ContactEvent);
}

/// Observer that ignores every event.
pub struct NoObserver;

impl CollisionObserver for NoObserver {
    fn on_collide(&mut self, _event: &ContactEvent) {}
}

struct Impact {
    collider1: ColliderHandle,
    collider2: ColliderHandle,
    impact_velocity: f32,
}

/// Buffers collision starts emitted during a pipeline step.
///
/// rapier requires `Send + Sync` handlers; the mutex is only touched from the
/// thread that steps the world.
#[derive(Default)]
struct ImpactRecorder {
    impacts: Mutex<Vec<Impact>>,
}

impl EventHandler for ImpactRecorder {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        if !event.started() {
            return;
        }
        let Some(pair) = contact_pair else {
            return;
        };
        let impact = Impact {
            collider1: event.collider1(),
            collider2: event.collider2(),
            impact_velocity: impact_velocity_along_normal(bodies, colliders, pair),
        };
        if let Ok(mut impacts) = self.impacts.lock() {
            impacts.push(impact);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// `(v1 - v2) . n` at the first tracked contact point, `n` pointing from collider 1 to 2.
fn impact_velocity_along_normal(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    pair: &ContactPair,
) -> f32 {
    let (Some(co1), Some(co2)) = (colliders.get(pair.collider1), colliders.get(pair.collider2))
    else {
        return 0.0;
    };
    let Some((manifold, contact)) = pair
        .manifolds
        .iter()
        .find_map(|m| m.points.first().map(|p| (m, p)))
    else {
        return 0.0;
    };

    let normal = co1.position() * manifold.local_n1;
    let point = co1.position() * contact.local_p1;
    let velocity = |co: &Collider| {
        co.parent()
            .and_then(|handle| bodies.get(handle))
            .map(|body| body.velocity_at_point(&point))
            .unwrap_or_else(Vector::<Real>::zeros)
    };

    (velocity(co1) - velocity(co2)).dot(&normal)
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_glam(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// All rapier state plus the scene-level stepping policy.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    recorder: ImpactRecorder,
    contact_material: ContactMaterial,
    allow_sleep: bool,
    /// Bodies whose collisions are reported to observers.
    observed: HashSet<RigidBodyHandle>,
    /// Bodies carrying a force that must be cleared after the next internal step.
    transient_forces: Vec<RigidBodyHandle>,
    /// Simulated time, advanced by the caller's elapsed time (not by steps taken).
    time: f64,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3, allow_sleep: bool) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            recorder: ImpactRecorder::default(),
            contact_material: ContactMaterial {
                name: "default".to_string(),
                friction: 0.5,
                restitution: 0.0,
            },
            allow_sleep,
            observed: HashSet::new(),
            transient_forces: Vec::new(),
            time: 0.0,
        }
    }

    /// Register the contact material used by colliders created from now on.
    pub fn set_contact_material(&mut self, material: ContactMaterial) {
        log::info!(
            "Contact material '{}': friction {}, restitution {}",
            material.name,
            material.friction,
            material.restitution
        );
        self.contact_material = material;
    }

    pub fn contact_material(&self) -> &ContactMaterial {
        &self.contact_material
    }

    /// Insert a body and its collider.
    pub fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = if desc.mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .translation(to_vector(desc.position))
            .rotation(to_vector(desc.rotation.to_scaled_axis()))
            .can_sleep(self.allow_sleep)
            .build();
        let handle = self.bodies.insert(body);

        let collider = match desc.shape {
            BodyShape::Sphere { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            BodyShape::Ground => ColliderBuilder::halfspace(Vector::<Real>::y_axis()),
        }
        .friction(self.contact_material.friction)
        .restitution(self.contact_material.restitution)
        .active_events(ActiveEvents::COLLISION_EVENTS);
        let collider = if desc.mass > 0.0 {
            collider.mass(desc.mass)
        } else {
            collider
        };
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        BodyHandle(handle)
    }

    /// Report collisions of `body` to the observer passed to [`step`](Self::step).
    pub fn subscribe(&mut self, body: BodyHandle) {
        self.observed.insert(body.0);
    }

    pub fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(rb) = self.bodies.get_mut(body.0) {
            rb.set_translation(to_vector(position), true);
        }
    }

    pub fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body.0).map(|rb| to_glam(rb.translation()))
    }

    pub fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        self.bodies.get(body.0).map(|rb| {
            let q = &rb.rotation().coords;
            Quat::from_xyzw(q.x, q.y, q.z, q.w)
        })
    }

    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body.0).map(|rb| to_glam(rb.linvel()))
    }

    pub fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(body.0).map(|rb| rb.mass())
    }

    /// Apply `force` at `point`, both in the body's local frame, for the next
    /// internal step only. Returns false for an unknown handle.
    pub fn apply_local_force(&mut self, body: BodyHandle, force: Vec3, point: Vec3) -> bool {
        let Some(rotation) = self.rotation(body) else {
            return false;
        };
        let Some(rb) = self.bodies.get_mut(body.0) else {
            return false;
        };
        let world_force = rotation * force;
        let lever = rotation * point;
        rb.add_force(to_vector(world_force), true);
        rb.add_torque(to_vector(lever.cross(world_force)), true);
        self.transient_forces.push(body.0);
        true
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance the world with internal steps of `fixed_timestep`.
    ///
    /// `elapsed == 0` takes exactly one internal step. Otherwise the number of
    /// fixed-step boundaries crossed by `time + elapsed` is taken, capped at
    /// `max_sub_steps`; time beyond the cap is dropped. Returns the number of
    /// internal steps taken.
    pub fn step(
        &mut self,
        fixed_timestep: f64,
        elapsed: f64,
        max_sub_steps: u32,
        observer: &mut dyn CollisionObserver,
    ) -> u32 {
        let sub_steps = if elapsed == 0.0 {
            self.time += fixed_timestep;
            1
        } else {
            let boundaries = ((self.time + elapsed) / fixed_timestep).floor()
                - (self.time / fixed_timestep).floor();
            self.time += elapsed;
            let wanted = boundaries.max(0.0) as u32;
            if wanted > max_sub_steps {
                log::debug!(
                    "Physics behind real time: {wanted} steps due, {max_sub_steps} taken"
                );
            }
            wanted.min(max_sub_steps)
        };

        for _ in 0..sub_steps {
            self.internal_step(fixed_timestep as Real, observer);
        }
        sub_steps
    }

    fn internal_step(&mut self, dt: Real, observer: &mut dyn CollisionObserver) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.recorder,
        );

        for handle in self.transient_forces.drain(..) {
            if let Some(rb) = self.bodies.get_mut(handle) {
                rb.reset_forces(false);
                rb.reset_torques(false);
            }
        }

        self.dispatch_impacts(observer);
    }

    fn dispatch_impacts(&mut self, observer: &mut dyn CollisionObserver) {
        let impacts = match self.recorder.impacts.lock() {
            Ok(mut impacts) => std::mem::take(&mut *impacts),
            Err(_) => return,
        };

        for impact in impacts {
            let body1 = self.colliders.get(impact.collider1).and_then(|c| c.parent());
            let body2 = self.colliders.get(impact.collider2).and_then(|c| c.parent());
            for (body, other) in [(body1, body2), (body2, body1)] {
                let Some(body) = body else {
                    continue;
                };
                if self.observed.contains(&body) {
                    observer.on_collide(&ContactEvent {
                        body: BodyHandle(body),
                        other: other.map(BodyHandle),
                        impact_velocity: impact.impact_velocity,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED: f64 = 1.0 / 60.0;

    #[derive(Default)]
    struct Recorder {
        events: Vec<ContactEvent>,
    }

    impl CollisionObserver for Recorder {
        fn on_collide(&mut self, event: &ContactEvent) {
            self.events.push(*event);
        }
    }

    fn sphere_at(position: Vec3) -> BodyDesc {
        BodyDesc {
            mass: 2.0,
            shape: BodyShape::Sphere { radius: 0.25 },
            position,
            rotation: Quat::IDENTITY,
        }
    }

    fn world_with_ground() -> (PhysicsWorld, BodyHandle) {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), true);
        world.set_contact_material(ContactMaterial {
            name: "default".to_string(),
            friction: 0.1,
            restitution: 0.7,
        });
        let ground = world.add_body(&BodyDesc {
            mass: 0.0,
            shape: BodyShape::Ground,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        (world, ground)
    }

    // ── stepping policy ──

    #[test]
    fn test_large_delta_is_capped_at_max_sub_steps() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, true);
        assert_eq!(world.step(FIXED, 0.1, 3, &mut NoObserver), 3);
        assert!((world.time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_delta_takes_one_fixed_step() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, true);
        assert_eq!(world.step(FIXED, 0.0, 3, &mut NoObserver), 1);
        assert!((world.time() - FIXED).abs() < 1e-12);
    }

    #[test]
    fn test_small_deltas_accumulate() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, true);
        let steps: Vec<u32> = (0..5)
            .map(|_| world.step(FIXED, 0.004, 3, &mut NoObserver))
            .collect();
        assert_eq!(steps, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_dropped_time_is_not_replayed() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, true);
        assert_eq!(world.step(FIXED, 1.0, 3, &mut NoObserver), 3);
        // the next short frame only owes its own boundaries
        assert_eq!(world.step(FIXED, 0.04, 3, &mut NoObserver), 2);
    }

    // ── bodies ──

    #[test]
    fn test_mass_policy() {
        let (mut world, ground) = world_with_ground();
        let sphere = world.add_body(&sphere_at(Vec3::new(0.0, 3.0, 0.0)));
        assert!((world.mass(sphere).unwrap() - 2.0).abs() < 1e-4);

        for _ in 0..30 {
            world.step(FIXED, 0.0, 3, &mut NoObserver);
        }
        assert_eq!(world.position(ground), Some(Vec3::ZERO));
        assert!(world.position(sphere).unwrap().y < 3.0);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_contact_material_applies_to_new_bodies() {
        let (world, _) = world_with_ground();
        assert_eq!(world.contact_material().restitution, 0.7);
        assert_eq!(world.contact_material().friction, 0.1);
    }

    // ── collisions ──

    #[test]
    fn test_drop_reports_impact_for_subscribed_body() {
        let (mut world, ground) = world_with_ground();
        let sphere = world.add_body(&sphere_at(Vec3::new(0.0, 3.0, 0.0)));
        world.subscribe(sphere);

        let mut recorder = Recorder::default();
        for _ in 0..120 {
            world.step(FIXED, 0.0, 3, &mut recorder);
        }

        let first = recorder.events.first().expect("sphere should hit the ground");
        assert_eq!(first.body, sphere);
        assert_eq!(first.other, Some(ground));
        assert!(first.impact_velocity.abs() > 1.5, "impact {}", first.impact_velocity);
    }

    #[test]
    fn test_unsubscribed_body_is_silent() {
        let (mut world, _) = world_with_ground();
        world.add_body(&sphere_at(Vec3::new(0.0, 3.0, 0.0)));

        let mut recorder = Recorder::default();
        for _ in 0..120 {
            world.step(FIXED, 0.0, 3, &mut recorder);
        }
        assert!(recorder.events.is_empty());
    }

    // ── forces ──

    #[test]
    fn test_local_force_acts_for_one_step() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, false);
        let sphere = world.add_body(&sphere_at(Vec3::ZERO));

        assert!(world.apply_local_force(sphere, Vec3::new(5000.0, 0.0, 0.0), Vec3::ZERO));
        world.step(FIXED, 0.0, 3, &mut NoObserver);
        let expected = 5000.0 / 2.0 * FIXED as f32;
        let after_first = world.linear_velocity(sphere).unwrap();
        assert!((after_first.x - expected).abs() < 0.5, "vx {}", after_first.x);

        world.step(FIXED, 0.0, 3, &mut NoObserver);
        let after_second = world.linear_velocity(sphere).unwrap();
        assert!((after_second.x - after_first.x).abs() < 1e-3);
    }

    #[test]
    fn test_local_force_launches_ball_resting_on_ground() {
        let (mut world, _) = world_with_ground();
        let sphere = world.add_body(&sphere_at(Vec3::new(0.0, 0.25, 0.0)));

        assert!(world.apply_local_force(sphere, Vec3::new(5000.0, 0.0, 0.0), Vec3::ZERO));
        world.step(FIXED, 0.0, 3, &mut NoObserver);
        let vx = world.linear_velocity(sphere).unwrap().x;
        assert!(vx > 30.0, "vx {vx}");
    }

    #[test]
    fn test_local_force_follows_body_orientation() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, false);
        let mut desc = sphere_at(Vec3::ZERO);
        desc.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let sphere = world.add_body(&desc);

        world.apply_local_force(sphere, Vec3::new(600.0, 0.0, 0.0), Vec3::ZERO);
        world.step(FIXED, 0.0, 3, &mut NoObserver);
        let v = world.linear_velocity(sphere).unwrap();
        assert!(v.x.abs() < 1e-3);
        assert!((v.z + 5.0).abs() < 0.1, "vz {}", v.z);
    }
}
