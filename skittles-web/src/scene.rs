use glam::{Mat4, Quat, Vec3};
use skittles_render::{DirectionalLight, DrawItem, FrameView};
use skittles_shared::geometry::{self, MeshData};

use crate::transform;

/// Index of a shared geometry in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

/// Index of a shared material in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Opaque reference to a mesh node owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

/// Shape classes, built once and shared by every mesh of that class.
/// Per-instance size comes from the mesh scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryKind {
    /// Unit-radius sphere.
    Sphere { width_segments: u32, height_segments: u32 },
    /// Unit cube.
    Cuboid,
    /// XY-plane quad facing +Z.
    Plane { width: f32, height: f32 },
}

impl GeometryKind {
    pub fn build(&self) -> MeshData {
        match *self {
            GeometryKind::Sphere {
                width_segments,
                height_segments,
            } => geometry::sphere(1.0, width_segments, height_segments),
            GeometryKind::Cuboid => geometry::cuboid(1.0, 1.0, 1.0),
            GeometryKind::Plane { width, height } => geometry::plane(width, height),
        }
    }

    /// Local-space bounding radius, without building the mesh.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            GeometryKind::Sphere { .. } => 1.0,
            GeometryKind::Cuboid => 3.0_f32.sqrt() * 0.5,
            GeometryKind::Plane { width, height } => 0.5 * (width * width + height * height).sqrt(),
        }
    }
}

/// Metal/rough material parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
}

/// Runtime transform state of a mesh node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

pub struct MeshNode {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: TransformState,
}

pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Directional light shining from `position` towards `target`.
pub struct DirLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Perspective camera. `projection` is only refreshed by `update_projection`.
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn update_projection(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

/// Scene graph: shared geometries and materials, mesh nodes, lights.
#[derive(Default)]
pub struct SceneGraph {
    pub geometries: Vec<GeometryKind>,
    pub materials: Vec<StandardMaterial>,
    meshes: Vec<MeshNode>,
    pub ambient: Option<AmbientLight>,
    pub dir_lights: Vec<DirLight>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, kind: GeometryKind) -> GeometryId {
        self.geometries.push(kind);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Insert a mesh node and return its handle.
    pub fn add(&mut self, node: MeshNode) -> MeshHandle {
        self.meshes.push(node);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshNode> {
        self.meshes.get(handle.0)
    }

    pub fn mesh_mut(&mut self, handle: MeshHandle) -> Option<&mut MeshNode> {
        self.meshes.get_mut(handle.0)
    }

    pub fn num_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Camera and lighting for one frame.
    pub fn frame_view(&self, camera: &PerspectiveCamera) -> FrameView {
        let ambient = self
            .ambient
            .as_ref()
            .map(|a| a.color.map(|c| c * a.intensity))
            .unwrap_or([0.0; 3]);
        let lights = self
            .dir_lights
            .iter()
            .map(|light| DirectionalLight {
                direction: (light.target - light.position).normalize_or_zero(),
                color: light.color,
                intensity: light.intensity,
            })
            .collect();

        FrameView {
            view_proj: camera.view_projection(),
            camera_position: camera.position,
            ambient,
            lights,
        }
    }

    /// Draw list for every mesh whose geometry has been uploaded.
    /// `uploaded[geometry.0]` is the renderer handle for that geometry.
    pub fn draw_items(&self, uploaded: &[u64]) -> Vec<DrawItem> {
        self.meshes
            .iter()
            .filter_map(|node| {
                let mesh = *uploaded.get(node.geometry.0)?;
                let geometry = self.geometries.get(node.geometry.0)?;
                let material = self.materials.get(node.material.0)?;
                Some(DrawItem {
                    mesh,
                    model: transform::model_matrix(&node.transform),
                    bounding_radius: geometry.bounding_radius(),
                    base_color: material.color,
                    metalness: material.metalness,
                    roughness: material.roughness,
                    env_map_intensity: material.env_map_intensity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> StandardMaterial {
        StandardMaterial {
            color: [1.0; 4],
            metalness: 0.3,
            roughness: 0.4,
            env_map_intensity: 1.0,
        }
    }

    #[test]
    fn test_meshes_share_geometry_and_material() {
        let mut scene = SceneGraph::new();
        let geometry = scene.add_geometry(GeometryKind::Cuboid);
        let material = scene.add_material(white());
        let a = scene.add(MeshNode {
            geometry,
            material,
            transform: TransformState::default(),
        });
        let b = scene.add(MeshNode {
            geometry,
            material,
            transform: TransformState::default(),
        });
        assert_ne!(a, b);
        assert_eq!(scene.num_meshes(), 2);
        assert_eq!(scene.geometries.len(), 1);
        assert_eq!(scene.materials.len(), 1);
    }

    #[test]
    fn test_camera_aspect_requires_projection_update() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let before = camera.projection;
        camera.set_aspect(800.0 / 600.0);
        assert_eq!(camera.projection, before);
        camera.update_projection();
        assert_ne!(camera.projection, before);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_view_light_direction() {
        let mut scene = SceneGraph::new();
        scene.ambient = Some(AmbientLight {
            color: [1.0, 1.0, 1.0],
            intensity: 0.7,
        });
        scene.dir_lights.push(DirLight {
            position: Vec3::new(10.0, 0.0, 0.0),
            target: Vec3::ZERO,
            color: [1.0; 3],
            intensity: 0.2,
        });
        let camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let view = scene.frame_view(&camera);
        assert_eq!(view.ambient, [0.7, 0.7, 0.7]);
        assert_eq!(view.lights[0].direction, Vec3::NEG_X);
    }

    #[test]
    fn test_draw_items_skip_unuploaded_geometry() {
        let mut scene = SceneGraph::new();
        let sphere = scene.add_geometry(GeometryKind::Sphere {
            width_segments: 20,
            height_segments: 20,
        });
        let cube = scene.add_geometry(GeometryKind::Cuboid);
        let material = scene.add_material(white());
        for geometry in [sphere, cube, cube] {
            scene.add(MeshNode {
                geometry,
                material,
                transform: TransformState::default(),
            });
        }
        assert_eq!(scene.draw_items(&[7]).len(), 1);
        let items = scene.draw_items(&[7, 9]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].mesh, 9);
    }

    #[test]
    fn test_bounding_radius_matches_built_mesh() {
        for kind in [
            GeometryKind::Sphere {
                width_segments: 12,
                height_segments: 8,
            },
            GeometryKind::Cuboid,
            GeometryKind::Plane {
                width: 100.0,
                height: 10.0,
            },
        ] {
            let built = kind.build().bounding_radius();
            assert!((built - kind.bounding_radius()).abs() < 1e-3, "{kind:?}");
        }
    }
}
