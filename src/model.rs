use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Interleaved vertex as produced by the importer and consumed by the GPU.
///
/// Lit shading reads position/normal, flat shading reads position/color;
/// uv/tangent/bitangent ride along for textured materials.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub color: [f32; 3],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            color: [1.0; 3],
        }
    }
}

/// Surface colors and shininess resolved from the material library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::ONE,
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            shininess: 32.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

/// Reference to a texture image on disk, resolved relative to the model
/// file's directory. Decoding and upload happen outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    pub kind: TextureKind,
    pub path: PathBuf,
}

/// One drawable geometry + material + texture unit within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPart {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Material,
    pub textures: Vec<TextureRef>,
}

/// Which pipeline a model is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shading {
    /// Diffuse lighting from the scene light.
    Lit,
    /// Per-vertex colors, no lighting.
    Flat,
}

/// A named collection of mesh parts under one composed local transform.
///
/// The transform is always translate x rotate x scale. Rotations
/// accumulate in the order applied, so the final orientation is
/// path-dependent; the rolling effect relies on exactly that.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    parts: Vec<MeshPart>,
    shading: Shading,
    center: Vec3,
    rotation: Mat4,
    scale: Mat4,
}

impl Model {
    pub fn new(name: impl Into<String>, parts: Vec<MeshPart>, shading: Shading) -> Self {
        Self {
            name: name.into(),
            parts,
            shading,
            center: Vec3::ZERO,
            rotation: Mat4::IDENTITY,
            scale: Mat4::IDENTITY,
        }
    }

    /// Unit cube with distinct per-face colors, for running without assets.
    pub fn unit_cube() -> Self {
        let faces: [([f32; 3], [[f32; 3]; 4], [f32; 3]); 6] = [
            // normal, corners, face color
            (
                [0.0, 0.0, 1.0],
                [
                    [-0.5, -0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                ],
                [0.9, 0.1, 0.1],
            ),
            (
                [0.0, 0.0, -1.0],
                [
                    [0.5, -0.5, -0.5],
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, -0.5],
                ],
                [0.1, 0.9, 0.1],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, 0.5, -0.5],
                ],
                [0.1, 0.1, 0.9],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [0.5, -0.5, 0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
                [0.9, 0.9, 0.1],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                ],
                [0.9, 0.1, 0.9],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [-0.5, 0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                ],
                [0.1, 0.9, 0.9],
            ),
        ];

        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners, color) in faces {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(uvs) {
                vertices.push(Vertex {
                    position: *corner,
                    normal,
                    uv,
                    color,
                    ..Vertex::default()
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let part = MeshPart {
            vertices,
            indices,
            material: Material::default(),
            textures: Vec::new(),
        };
        Self::new("cube", vec![part], Shading::Flat)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[MeshPart] {
        &self.parts
    }

    pub fn shading(&self) -> Shading {
        self.shading
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.shading = shading;
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = Mat4::from_scale(scale);
    }

    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    /// Accumulates a rotation of `radians` about `axis` into the local
    /// transform. Later rotations compose on the right, matching the
    /// order the state machine applies its per-frame deltas.
    pub fn rotate(&mut self, radians: f32, axis: Vec3) {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return;
        }
        self.rotation = self.rotation * Mat4::from_axis_angle(axis, radians);
    }

    /// Composed local transform: translate x rotate x scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.center) * self.rotation * self.scale
    }

    /// Accumulated orientation as an axis/angle pair, for reporting.
    pub fn orientation(&self) -> (Vec3, f32) {
        Quat::from_mat4(&self.rotation).to_axis_angle()
    }
}

/// Integer id of a model stored in a [`ModelArena`].
///
/// Actors store handles instead of smart pointers, which makes "these two
/// actors share one model" an explicit, queryable relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle(usize);

impl ModelHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owning store for every model in a scene.
#[derive(Debug, Default)]
pub struct ModelArena {
    models: Vec<Model>,
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: Model) -> ModelHandle {
        let handle = ModelHandle(self.models.len());
        self.models.push(model);
        handle
    }

    pub fn get(&self, handle: ModelHandle) -> Option<&Model> {
        self.models.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: ModelHandle) -> Option<&mut Model> {
        self.models.get_mut(handle.0)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelHandle, &Model)> {
        self.models
            .iter()
            .enumerate()
            .map(|(index, model)| (ModelHandle(index), model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rotation_order_is_not_commutative() {
        let mut xy = Model::unit_cube();
        xy.rotate(FRAC_PI_2, Vec3::X);
        xy.rotate(FRAC_PI_2, Vec3::Y);

        let mut yx = Model::unit_cube();
        yx.rotate(FRAC_PI_2, Vec3::Y);
        yx.rotate(FRAC_PI_2, Vec3::X);

        assert!(!xy.rotation().abs_diff_eq(yx.rotation(), 1e-6));
    }

    #[test]
    fn half_steps_compose_to_the_full_rotation() {
        let mut halves = Model::unit_cube();
        halves.rotate(FRAC_PI_2 / 2.0, Vec3::Z);
        halves.rotate(FRAC_PI_2 / 2.0, Vec3::Z);

        let mut whole = Model::unit_cube();
        whole.rotate(FRAC_PI_2, Vec3::Z);

        assert!(halves.rotation().abs_diff_eq(whole.rotation(), 1e-5));
    }

    #[test]
    fn transform_order_is_translate_rotate_scale() {
        let mut model = Model::unit_cube();
        model.set_center(Vec3::new(1.0, 0.0, 0.0));
        model.set_scale(Vec3::splat(2.0));

        let matrix = model.model_matrix();
        assert!(matrix
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        // Scale applies before the translation.
        assert!(matrix
            .transform_point3(Vec3::X)
            .abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn zero_axis_rotation_is_a_no_op() {
        let mut model = Model::unit_cube();
        model.rotate(FRAC_PI_2, Vec3::ZERO);
        assert!(model.rotation().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn orientation_reports_the_accumulated_axis_angle() {
        let mut model = Model::unit_cube();
        model.rotate(FRAC_PI_2, Vec3::Z);
        let (axis, angle) = model.orientation();
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-5));
        assert!((angle - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn unit_cube_has_one_flat_part() {
        let cube = Model::unit_cube();
        assert_eq!(cube.parts().len(), 1);
        assert_eq!(cube.parts()[0].vertices.len(), 24);
        assert_eq!(cube.parts()[0].indices.len(), 36);
        assert_eq!(cube.shading(), Shading::Flat);
    }

    #[test]
    fn arena_hands_out_stable_handles() {
        let mut arena = ModelArena::new();
        let a = arena.insert(Model::unit_cube());
        let b = arena.insert(Model::unit_cube());
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        arena.get_mut(a).unwrap().rotate(FRAC_PI_2, Vec3::X);
        assert!(!arena
            .get(a)
            .unwrap()
            .rotation()
            .abs_diff_eq(arena.get(b).unwrap().rotation(), 1e-6));
    }
}
