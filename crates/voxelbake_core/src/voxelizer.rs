//! # Surface Voxelizer
//!
//! Converts colored triangles into a sparse grid of colored cells.
//!
//! ## Algorithm
//!
//! For each triangle:
//! 1. Take its world-space AABB, grown by one edge length on every side
//! 2. Map it to an inclusive cell range (`floor` the min, `ceil` the max)
//! 3. Cell `i` is centered at `i * edge`; keep the cell if the distance from
//!    that center to the triangle is at most `edge / 2`
//!
//! Later triangles overwrite earlier ones at shared cells. There is no
//! blending: the last face in input order owns the cell.
//!
//! ## Cost
//!
//! Proportional to the sum over triangles of cells in the grown AABB. Long
//! thin diagonal triangles are the worst case.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

use rayon::prelude::*;

use crate::color::Color;
use crate::error::{ExportError, ExportResult};
use crate::math::{point_triangle_distance, Vec3};
use crate::mesh::ColoredTriangle;

/// Sine of the corner angle at `a` below which a triangle is treated as
/// degenerate. Relative to the edge lengths, so mesh scale does not matter.
const DEGENERATE_SINE: f64 = 1e-12;

/// Integer cell coordinate in the global grid.
///
/// Ordering is lexicographic on `(x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VoxelPosition {
    /// X cell index.
    pub x: i32,
    /// Y cell index.
    pub y: i32,
    /// Z cell index.
    pub z: i32,
}

impl VoxelPosition {
    /// Creates a position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

/// Sparse voxel set: cell → color, one color per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelGrid {
    cells: BTreeMap<VoxelPosition, Color>,
}

impl VoxelGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a cell. Returns the color it replaced, if any.
    pub fn insert(&mut self, position: VoxelPosition, color: Color) -> Option<Color> {
        self.cells.insert(position, color)
    }

    /// Color at `position`.
    #[must_use]
    pub fn get(&self, position: VoxelPosition) -> Option<Color> {
        self.cells.get(&position).copied()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Occupied cells in ascending `(x, y, z)` order.
    pub fn iter(&self) -> impl Iterator<Item = (VoxelPosition, Color)> + '_ {
        self.cells.iter().map(|(pos, color)| (*pos, *color))
    }

    /// Inclusive `(min, max)` corners, `None` for an empty grid.
    #[must_use]
    pub fn bounds(&self) -> Option<(VoxelPosition, VoxelPosition)> {
        let mut positions = self.cells.keys().copied();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

impl FromIterator<(VoxelPosition, Color)> for VoxelGrid {
    fn from_iter<I: IntoIterator<Item = (VoxelPosition, Color)>>(iter: I) -> Self {
        let mut grid = Self::new();
        for (pos, color) in iter {
            grid.insert(pos, color);
        }
        grid
    }
}

impl<'a> IntoIterator for &'a VoxelGrid {
    type Item = (&'a VoxelPosition, &'a Color);
    type IntoIter = btree_map::Iter<'a, VoxelPosition, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Voxelizes triangles in input order.
///
/// # Errors
///
/// [`ExportError::InvalidParameter`] if `edge` is not a positive finite
/// number, a vertex is not finite, or a triangle reaches past the `i32`
/// cell range.
pub fn voxelize(triangles: &[ColoredTriangle], edge: f64) -> ExportResult<VoxelGrid> {
    validate(triangles, edge)?;

    let mut grid = VoxelGrid::new();
    let mut degenerate = 0usize;

    for tri in triangles {
        if is_degenerate(tri) {
            degenerate += 1;
            continue;
        }
        let range = CellRange::around(tri, edge)?;
        range.for_each_hit(tri, edge, |pos| {
            grid.insert(pos, tri.color);
        });
    }

    log_result(triangles.len(), degenerate, &grid);
    Ok(grid)
}

/// Voxelizes triangles on the rayon pool.
///
/// Produces exactly the grid [`voxelize`] would: every write is tagged with
/// its triangle's input index and a contested cell keeps the highest index.
///
/// # Errors
///
/// Same as [`voxelize`].
pub fn voxelize_parallel(triangles: &[ColoredTriangle], edge: f64) -> ExportResult<VoxelGrid> {
    validate(triangles, edge)?;

    // Range errors surface before any work is spawned
    let ranges = triangles
        .iter()
        .map(|tri| {
            if is_degenerate(tri) {
                Ok(None)
            } else {
                CellRange::around(tri, edge).map(Some)
            }
        })
        .collect::<ExportResult<Vec<_>>>()?;
    let degenerate = ranges.iter().filter(|r| r.is_none()).count();

    let tagged: HashMap<VoxelPosition, (usize, Color)> = triangles
        .par_iter()
        .zip(ranges.par_iter())
        .enumerate()
        .filter_map(|(seq, (tri, range))| range.as_ref().map(|r| (seq, tri, r)))
        .fold(HashMap::new, |mut cells, (seq, tri, range)| {
            range.for_each_hit(tri, edge, |pos| {
                keep_latest(&mut cells, pos, seq, tri.color);
            });
            cells
        })
        .reduce(HashMap::new, |mut left, right| {
            for (pos, (seq, color)) in right {
                keep_latest(&mut left, pos, seq, color);
            }
            left
        });

    let grid: VoxelGrid = tagged
        .into_iter()
        .map(|(pos, (_, color))| (pos, color))
        .collect();

    log_result(triangles.len(), degenerate, &grid);
    Ok(grid)
}

fn keep_latest(
    cells: &mut HashMap<VoxelPosition, (usize, Color)>,
    pos: VoxelPosition,
    seq: usize,
    color: Color,
) {
    let slot = cells.entry(pos).or_insert((seq, color));
    if seq >= slot.0 {
        *slot = (seq, color);
    }
}

fn validate(triangles: &[ColoredTriangle], edge: f64) -> ExportResult<()> {
    if !edge.is_finite() || edge <= 0.0 {
        return Err(ExportError::invalid(format!(
            "voxel edge length must be a positive finite number, got {edge}"
        )));
    }
    if let Some(index) = triangles
        .iter()
        .position(|tri| tri.vertices.iter().any(|v| !v.is_finite()))
    {
        return Err(ExportError::invalid(format!(
            "triangle {index} has a non-finite vertex"
        )));
    }
    Ok(())
}

fn is_degenerate(tri: &ColoredTriangle) -> bool {
    let [a, b, c] = tri.vertices;
    let ab = (b - a).length_squared();
    let ac = (c - a).length_squared();
    // |ab x ac|^2 = |ab|^2 |ac|^2 sin^2
    tri.doubled_normal().length_squared() <= DEGENERATE_SINE * DEGENERATE_SINE * ab * ac
}

fn log_result(total: usize, degenerate: usize, grid: &VoxelGrid) {
    if degenerate > 0 {
        tracing::debug!(degenerate, "skipped zero-area triangles");
    }
    tracing::info!(triangles = total, voxels = grid.len(), "voxelized mesh");
}

/// Inclusive candidate cell range for one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min: VoxelPosition,
    max: VoxelPosition,
}

impl CellRange {
    fn around(tri: &ColoredTriangle, edge: f64) -> ExportResult<Self> {
        let (lo, hi) = tri.bounds();
        let lo = lo - Vec3::splat(edge);
        let hi = hi + Vec3::splat(edge);

        Ok(Self {
            min: VoxelPosition::new(
                to_cell((lo.x / edge).floor())?,
                to_cell((lo.y / edge).floor())?,
                to_cell((lo.z / edge).floor())?,
            ),
            max: VoxelPosition::new(
                to_cell((hi.x / edge).ceil())?,
                to_cell((hi.y / edge).ceil())?,
                to_cell((hi.z / edge).ceil())?,
            ),
        })
    }

    /// Calls `hit` for every cell whose center is within half an edge of `tri`.
    fn for_each_hit(&self, tri: &ColoredTriangle, edge: f64, mut hit: impl FnMut(VoxelPosition)) {
        let half = edge * 0.5;
        let [a, b, c] = tri.vertices;

        for x in self.min.x..=self.max.x {
            for y in self.min.y..=self.max.y {
                for z in self.min.z..=self.max.z {
                    let center = Vec3::new(
                        f64::from(x) * edge,
                        f64::from(y) * edge,
                        f64::from(z) * edge,
                    );
                    if point_triangle_distance(center, a, b, c) <= half {
                        hit(VoxelPosition::new(x, y, z));
                    }
                }
            }
        }
    }
}

fn to_cell(value: f64) -> ExportResult<i32> {
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(ExportError::invalid(format!(
            "mesh extends past the addressable grid (cell index {value})"
        )));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    fn tri(a: [f64; 3], b: [f64; 3], c: [f64; 3], color: Color) -> ColoredTriangle {
        ColoredTriangle::new(
            [
                Vec3::new(a[0], a[1], a[2]),
                Vec3::new(b[0], b[1], b[2]),
                Vec3::new(c[0], c[1], c[2]),
            ],
            color,
        )
    }

    /// Two triangles covering the square [0, n] x [0, n] at height z.
    fn quad(n: f64, z: f64, color: Color) -> [ColoredTriangle; 2] {
        [
            tri([0.0, 0.0, z], [n, 0.0, z], [n, n, z], color),
            tri([0.0, 0.0, z], [n, n, z], [0.0, n, z], color),
        ]
    }

    #[test]
    fn test_rejects_bad_edge_length() {
        let tris = [tri([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], RED)];
        for edge in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = voxelize(&tris, edge).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
            let err = voxelize_parallel(&tris, edge).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
    }

    #[test]
    fn test_rejects_non_finite_vertex() {
        let tris = [tri([f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], RED)];
        assert_eq!(voxelize(&tris, 1.0).unwrap_err().kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_tiny_triangle_hits_single_cell() {
        let tris = [tri([0.0; 3], [0.1, 0.0, 0.0], [0.0, 0.1, 0.0], RED)];
        let grid = voxelize(&tris, 1.0).unwrap();

        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(VoxelPosition::new(0, 0, 0)), Some(RED));
    }

    #[test]
    fn test_flat_quad_is_one_cell_thick() {
        let grid = voxelize(&quad(4.0, 0.0, RED), 1.0).unwrap();

        // Every lattice point of the 5x5 square, nothing above or below
        assert_eq!(grid.len(), 25);
        for (pos, color) in grid.iter() {
            assert_eq!(pos.z, 0);
            assert!((0..=4).contains(&pos.x) && (0..=4).contains(&pos.y));
            assert_eq!(color, RED);
        }
    }

    #[test]
    fn test_edge_length_scales_grid() {
        let grid = voxelize(&quad(4.0, 0.0, RED), 2.0).unwrap();
        // Centers at 0, 2, 4 on each axis
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.bounds(), Some((VoxelPosition::new(0, 0, 0), VoxelPosition::new(2, 2, 0))));
    }

    #[test]
    fn test_degenerate_triangles_are_skipped() {
        let tris = [
            tri([0.0; 3], [0.0; 3], [0.0; 3], RED),
            tri([0.0; 3], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0], RED),
        ];
        assert!(voxelize(&tris, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_micro_scale_triangle_is_kept() {
        let micro = [tri([0.0; 3], [1e-6, 0.0, 0.0], [0.0, 1e-6, 0.0], RED)];
        let grid = voxelize(&micro, 1e-7).unwrap();
        assert!(grid.len() > 10);
        assert_eq!(grid.get(VoxelPosition::new(0, 0, 0)), Some(RED));
        assert_eq!(grid.get(VoxelPosition::new(2, 2, 0)), Some(RED));

        let unit = [tri([0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], RED)];
        assert!(!voxelize(&unit, 0.1).unwrap().is_empty());
    }

    /// Shared cells take the color of the last triangle, no blending.
    #[test]
    fn test_last_writer_wins_at_shared_cells() {
        let mut tris = quad(2.0, 0.0, RED).to_vec();
        tris.extend(quad(2.0, 0.0, BLUE));
        let grid = voxelize(&tris, 1.0).unwrap();
        assert!(grid.iter().all(|(_, c)| c == BLUE));

        tris.reverse();
        let grid = voxelize(&tris, 1.0).unwrap();
        assert!(grid.iter().all(|(_, c)| c == RED));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut tris = Vec::new();
        for i in 0..16_i32 {
            let z = f64::from(i) * 0.25;
            let color = if i % 2 == 0 { RED } else { BLUE };
            tris.extend(quad(6.0, z, color));
            tris.push(tri(
                [0.0, 0.0, z],
                [6.0, 3.0, z + 2.0],
                [1.0, 6.0, z + 0.5],
                Color::new(i as u8, 9, 9),
            ));
        }

        let sequential = voxelize(&tris, 0.5).unwrap();
        let parallel = voxelize_parallel(&tris, 0.5).unwrap();
        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_negative_coordinates() {
        let tris = [tri([-3.0, -3.0, -3.0], [-2.9, -3.0, -3.0], [-3.0, -2.9, -3.0], RED)];
        let grid = voxelize(&tris, 1.0).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(VoxelPosition::new(-3, -3, -3)), Some(RED));
    }

    #[test]
    fn test_grid_bounds() {
        let grid: VoxelGrid = [
            (VoxelPosition::new(-1, 4, 2), RED),
            (VoxelPosition::new(3, -2, 0), BLUE),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            grid.bounds(),
            Some((VoxelPosition::new(-1, -2, 0), VoxelPosition::new(3, 4, 2)))
        );
        assert_eq!(VoxelGrid::new().bounds(), None);
    }
}
