//! Immutable mesh snapshot handed to the core by a mesh/material provider.
//!
//! The provider resolves whatever live scene state it owns (editor objects,
//! OBJ files, modifiers) into these plain values before calling the core.
//! Nothing here points back into provider state.

use crate::color::{sample_face_color, Color};
use crate::math::Vec3;

/// One world-space input triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTriangle {
    /// Vertex positions in world space, in loop order.
    pub vertices: [Vec3; 3],
    /// Per-loop linear RGB colors in `[0, 1]`, when the mesh has a color channel.
    pub vertex_colors: Option<[[f32; 3]; 3]>,
    /// Index into [`MeshSnapshot::materials`].
    pub material_index: Option<usize>,
}

impl MeshTriangle {
    /// Creates an uncolored triangle with no material.
    #[must_use]
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
            vertex_colors: None,
            material_index: None,
        }
    }

    /// Sets the material index.
    #[must_use]
    pub fn with_material(mut self, index: usize) -> Self {
        self.material_index = Some(index);
        self
    }

    /// Sets the per-loop vertex colors.
    #[must_use]
    pub fn with_vertex_colors(mut self, colors: [[f32; 3]; 3]) -> Self {
        self.vertex_colors = Some(colors);
        self
    }
}

/// A material as far as color sampling is concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name, only used in logs.
    pub name: String,
    /// Linear base color, `None` when the material has no base-color input.
    pub base_color: Option<[f32; 3]>,
}

impl Material {
    /// Creates a material.
    #[must_use]
    pub fn new(name: impl Into<String>, base_color: Option<[f32; 3]>) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }
}

/// Everything the core needs from the provider for one export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSnapshot {
    /// Triangles in provider order. Order matters: later faces win shared cells.
    pub triangles: Vec<MeshTriangle>,
    /// Material table indexed by [`MeshTriangle::material_index`].
    pub materials: Vec<Material>,
}

impl MeshSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(triangles: Vec<MeshTriangle>, materials: Vec<Material>) -> Self {
        Self {
            triangles,
            materials,
        }
    }

    /// Resolves every face to a single color, keeping input order.
    #[must_use]
    pub fn colored_triangles(&self) -> Vec<ColoredTriangle> {
        self.triangles
            .iter()
            .map(|tri| ColoredTriangle {
                vertices: tri.vertices,
                color: sample_face_color(tri, &self.materials),
            })
            .collect()
    }
}

/// Voxelizer input: a triangle with its resolved color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredTriangle {
    /// Vertex positions in world space.
    pub vertices: [Vec3; 3],
    /// Face color.
    pub color: Color,
}

impl ColoredTriangle {
    /// Creates a colored triangle.
    #[must_use]
    pub const fn new(vertices: [Vec3; 3], color: Color) -> Self {
        Self { vertices, color }
    }

    /// Twice the triangle's area vector; zero for degenerate triangles.
    #[must_use]
    pub fn doubled_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(c - a)
    }

    /// Component-wise (min, max) corners.
    #[must_use]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let [a, b, c] = self.vertices;
        (a.min(b).min(c), a.max(b).max(c))
    }
}
