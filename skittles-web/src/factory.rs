use glam::{Quat, Vec3};

use crate::physics::{BodyDesc, BodyShape, PhysicsWorld};
use crate::registry::{SyncPair, SyncRegistry};
use crate::scene::{GeometryId, MaterialId, MeshNode, SceneGraph, TransformState};

/// Shared visual resources and mass policy for one shape class.
#[derive(Debug, Clone, Copy)]
pub struct ShapeClass {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub mass: f32,
}

/// Creates matched mesh/body pairs and registers them for synchronization.
pub struct BodyFactory {
    pub sphere: ShapeClass,
    pub cuboid: ShapeClass,
}

impl BodyFactory {
    pub fn new(sphere: ShapeClass, cuboid: ShapeClass) -> Self {
        Self { sphere, cuboid }
    }

    /// Spawn a sphere. The mesh is the shared unit sphere scaled by `radius`.
    pub fn create_sphere(
        &self,
        scene: &mut SceneGraph,
        physics: &mut PhysicsWorld,
        registry: &mut SyncRegistry,
        radius: f32,
        position: Vec3,
    ) -> SyncPair {
        debug_assert!(radius > 0.0, "sphere radius must be positive");
        spawn(
            scene,
            physics,
            registry,
            self.sphere,
            BodyShape::Sphere { radius },
            Vec3::splat(radius),
            position,
        )
    }

    /// Spawn a box. The mesh is the shared unit cube scaled to the dimensions;
    /// the collider uses half of each dimension.
    #[allow(clippy::too_many_arguments)]
    pub fn create_box(
        &self,
        scene: &mut SceneGraph,
        physics: &mut PhysicsWorld,
        registry: &mut SyncRegistry,
        width: f32,
        height: f32,
        depth: f32,
        position: Vec3,
    ) -> SyncPair {
        debug_assert!(
            width > 0.0 && height > 0.0 && depth > 0.0,
            "box dimensions must be positive"
        );
        let size = Vec3::new(width, height, depth);
        spawn(
            scene,
            physics,
            registry,
            self.cuboid,
            BodyShape::Cuboid {
                half_extents: size * 0.5,
            },
            size,
            position,
        )
    }
}

fn spawn(
    scene: &mut SceneGraph,
    physics: &mut PhysicsWorld,
    registry: &mut SyncRegistry,
    class: ShapeClass,
    shape: BodyShape,
    scale: Vec3,
    position: Vec3,
) -> SyncPair {
    let mesh = scene.add(MeshNode {
        geometry: class.geometry,
        material: class.material,
        transform: TransformState {
            position,
            rotation: Quat::IDENTITY,
            scale,
        },
    });

    let body = physics.add_body(&BodyDesc {
        mass: class.mass,
        shape,
        position,
        rotation: Quat::IDENTITY,
    });
    // Idempotent; keeps the spawn position authoritative over builder defaults.
    physics.set_position(body, position);
    physics.subscribe(body);

    let pair = SyncPair { mesh, body };
    registry.push(pair);
    log::debug!("Spawned {shape:?} at {position}");
    pair
}
