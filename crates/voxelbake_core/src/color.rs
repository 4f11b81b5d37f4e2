//! Colors and the per-face color sampler.
//!
//! Sampling priority is fixed: vertex colors, then the material's base
//! color, then opaque white.

use crate::mesh::{Material, MeshTriangle};

/// An opaque 8-bit RGB color. Alpha is always written as 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Color {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
}

impl Color {
    /// Fallback for faces with no color information.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a color from its components.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts linear float channels in `[0, 1]` to bytes.
    ///
    /// Channels are clamped, then truncated (`0.999` → 254). NaN maps to 0.
    #[must_use]
    pub fn from_unit_rgb(rgb: [f32; 3]) -> Self {
        Self::new(unit_to_byte(rgb[0]), unit_to_byte(rgb[1]), unit_to_byte(rgb[2]))
    }

    /// Squared Euclidean distance in RGB space.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Returns the color as `[r, g, b, 255]`.
    #[inline]
    #[must_use]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

#[inline]
fn unit_to_byte(channel: f32) -> u8 {
    // `as` saturates and maps NaN to 0
    (channel.clamp(0.0, 1.0) * 255.0) as u8
}

/// Resolves the color of one face.
///
/// 1. the first loop's vertex color, if the face carries vertex colors
/// 2. the base color of the face's material, if it has one
/// 3. [`Color::WHITE`]
#[must_use]
pub fn sample_face_color(triangle: &MeshTriangle, materials: &[Material]) -> Color {
    if let Some(loops) = &triangle.vertex_colors {
        return Color::from_unit_rgb(loops[0]);
    }

    triangle
        .material_index
        .and_then(|index| materials.get(index))
        .and_then(|material| material.base_color)
        .map_or(Color::WHITE, Color::from_unit_rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn triangle(
        vertex_colors: Option<[[f32; 3]; 3]>,
        material_index: Option<usize>,
    ) -> MeshTriangle {
        MeshTriangle {
            vertices: [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vertex_colors,
            material_index,
        }
    }

    fn red_material() -> Vec<Material> {
        vec![Material::new("red", Some([1.0, 0.0, 0.0]))]
    }

    #[test]
    fn test_unit_scaling_truncates() {
        assert_eq!(Color::from_unit_rgb([1.0, 0.5, 0.0]), Color::new(255, 127, 0));
        assert_eq!(Color::from_unit_rgb([1.5, -0.2, f32::NAN]), Color::new(255, 0, 0));
    }

    #[test]
    fn test_vertex_color_wins_over_material() {
        let tri = triangle(
            Some([[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
            Some(0),
        );
        // First loop only, the other two are ignored
        assert_eq!(sample_face_color(&tri, &red_material()), Color::new(0, 255, 0));
    }

    #[test]
    fn test_material_base_color() {
        let tri = triangle(None, Some(0));
        assert_eq!(sample_face_color(&tri, &red_material()), Color::new(255, 0, 0));
    }

    #[test]
    fn test_white_fallback() {
        // No material at all
        assert_eq!(sample_face_color(&triangle(None, None), &[]), Color::WHITE);
        // Index past the table
        assert_eq!(sample_face_color(&triangle(None, Some(3)), &red_material()), Color::WHITE);
        // Material without a base color input
        let plain = vec![Material::new("plain", None)];
        assert_eq!(sample_face_color(&triangle(None, Some(0)), &plain), Color::WHITE);
    }

    #[test]
    fn test_distance_squared() {
        assert_eq!(Color::new(0, 0, 0).distance_squared(Color::new(3, 4, 0)), 25);
        assert_eq!(Color::WHITE.distance_squared(Color::WHITE), 0);
    }
}
