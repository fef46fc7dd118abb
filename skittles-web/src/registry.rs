use crate::physics::{BodyHandle, PhysicsWorld};
use crate::scene::{MeshHandle, SceneGraph};

/// One visual mesh bound to the physics body that drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPair {
    pub mesh: MeshHandle,
    pub body: BodyHandle,
}

/// Append-only list of mesh/body pairs, in spawn order.
#[derive(Debug, Default)]
pub struct SyncRegistry {
    pairs: Vec<SyncPair>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: SyncPair) {
        debug_assert!(
            !self.pairs.iter().any(|p| p.mesh == pair.mesh || p.body == pair.body),
            "mesh or body already paired"
        );
        self.pairs.push(pair);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncPair> {
        self.pairs.iter()
    }

    /// Copy every body's position and orientation onto its mesh.
    pub fn sync_all(&self, physics: &PhysicsWorld, scene: &mut SceneGraph) {
        for pair in &self.pairs {
            let (Some(position), Some(rotation)) =
                (physics.position(pair.body), physics.rotation(pair.body))
            else {
                continue;
            };
            if let Some(node) = scene.mesh_mut(pair.mesh) {
                node.transform.position = position;
                node.transform.rotation = rotation;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDesc, BodyShape, NoObserver};
    use crate::scene::{GeometryKind, MeshNode, StandardMaterial, TransformState};
    use glam::{Quat, Vec3};

    #[test]
    fn test_sync_copies_position_and_rotation_but_not_scale() {
        let mut physics = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), false);
        let mut scene = SceneGraph::new();
        let geometry = scene.add_geometry(GeometryKind::Cuboid);
        let material = scene.add_material(StandardMaterial {
            color: [1.0; 4],
            metalness: 0.0,
            roughness: 1.0,
            env_map_intensity: 0.0,
        });

        let body = physics.add_body(&BodyDesc {
            mass: 1.0,
            shape: BodyShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
            position: Vec3::new(1.0, 5.0, 2.0),
            rotation: Quat::from_rotation_z(0.4),
        });
        let mesh = scene.add(MeshNode {
            geometry,
            material,
            transform: TransformState {
                scale: Vec3::new(1.0, 2.0, 3.0),
                ..Default::default()
            },
        });

        let mut registry = SyncRegistry::new();
        registry.push(SyncPair { mesh, body });
        for _ in 0..10 {
            physics.step(1.0 / 60.0, 0.0, 3, &mut NoObserver);
        }
        registry.sync_all(&physics, &mut scene);

        let node = scene.mesh(mesh).unwrap();
        assert_eq!(Some(node.transform.position), physics.position(body));
        assert_eq!(Some(node.transform.rotation), physics.rotation(body));
        assert!(node.transform.position.y < 5.0);
        assert_eq!(node.transform.scale, Vec3::new(1.0, 2.0, 3.0));
    }
}
