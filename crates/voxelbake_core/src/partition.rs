//! # Chunk Partitioner
//!
//! A single model in the format is at most 256 cells per axis. Larger voxel
//! sets are cut into 256-aligned buckets, each becoming its own model that
//! the scene graph translates back into place.
//!
//! ```text
//!  normalized x:  0 ........ 255 | 256 ........ 511 | 512 ...
//!  bucket cx:           0        |        1         |    2
//!  local x:       0 ........ 255 |   0 ........ 255 |   0 ...
//! ```
//!
//! Buckets are ordered by `(cx, cy, cz)` ascending. That order is the model
//! index everywhere downstream (SIZE/XYZI order, `nSHP` model ids, group
//! children).

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use crate::color::Color;
use crate::error::{ExportError, ExportResult};
use crate::palette::PaletteBuilder;
use crate::voxelizer::VoxelGrid;

/// Maximum model extent per axis.
pub const MAX_MODEL_SIZE: u32 = 256;

/// One voxel inside a bucket, before palette assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketVoxel {
    /// Local coordinates, each in `0..size`.
    pub local: [u8; 3],
    /// Voxel color.
    pub color: Color,
}

/// A 256-aligned sub-volume of the normalized voxel set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBucket {
    /// Bucket key `(cx, cy, cz)`.
    pub key: [u32; 3],
    /// Extent per axis: max observed local coordinate + 1.
    pub size: [u32; 3],
    /// Origin in normalized global space (`key * 256`).
    pub offset: [u32; 3],
    /// Voxels in ascending global `(x, y, z)` order.
    pub voxels: Vec<BucketVoxel>,
}

/// One XYZI record: local coordinates plus palette index.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
pub struct ModelVoxel {
    /// Local X.
    pub x: u8,
    /// Local Y.
    pub y: u8,
    /// Local Z.
    pub z: u8,
    /// Palette index, 1..=255.
    pub color_index: u8,
}

/// An encodable model: size, paletted voxels, and scene placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Extent per axis, each in `1..=256`.
    pub size: [u32; 3],
    /// Paletted voxels in partitioner order.
    pub voxels: Vec<ModelVoxel>,
    /// Translation of the model origin in normalized global space.
    pub offset: [u32; 3],
}

impl Model {
    /// True if the offset is `(0, 0, 0)`.
    #[must_use]
    pub fn at_origin(&self) -> bool {
        self.offset == [0, 0, 0]
    }
}

/// Splits a voxel set into 256-aligned buckets in canonical order.
///
/// # Errors
///
/// - [`ExportError::EmptyResult`] if the grid is empty
/// - [`ExportError::InternalInvariantViolation`] if a bucket exceeds 256 on
///   any axis
pub fn partition(grid: &VoxelGrid) -> ExportResult<Vec<ModelBucket>> {
    let Some((min, _)) = grid.bounds() else {
        return Err(ExportError::EmptyResult(
            "voxelization produced no voxels".to_string(),
        ));
    };

    let mut buckets: BTreeMap<[u32; 3], ModelBucket> = BTreeMap::new();

    for (pos, color) in grid.iter() {
        let normalized = [
            normalize(pos.x, min.x),
            normalize(pos.y, min.y),
            normalize(pos.z, min.z),
        ];
        let key = normalized.map(|n| n / MAX_MODEL_SIZE);
        let local = normalized.map(|n| (n % MAX_MODEL_SIZE) as u8);

        let bucket = buckets.entry(key).or_insert_with(|| ModelBucket {
            key,
            size: [0; 3],
            offset: key.map(|k| k * MAX_MODEL_SIZE),
            voxels: Vec::new(),
        });
        for axis in 0..3 {
            bucket.size[axis] = bucket.size[axis].max(u32::from(local[axis]) + 1);
        }
        bucket.voxels.push(BucketVoxel { local, color });
    }

    let buckets: Vec<ModelBucket> = buckets.into_values().collect();
    for (index, bucket) in buckets.iter().enumerate() {
        if bucket.size.iter().any(|&s| s == 0 || s > MAX_MODEL_SIZE) {
            return Err(ExportError::InternalInvariantViolation(format!(
                "model {index} has size {:?}, limit is {MAX_MODEL_SIZE}",
                bucket.size
            )));
        }
    }

    tracing::debug!(
        models = buckets.len(),
        voxels = grid.len(),
        "partitioned voxel set"
    );
    Ok(buckets)
}

/// Distance of `value` above `min` along one axis. Fits `u32` for any pair
/// of `i32`s with `value >= min`.
#[inline]
fn normalize(value: i32, min: i32) -> u32 {
    (i64::from(value) - i64::from(min)) as u32
}

/// Assigns palette indices to every bucket, in model order.
///
/// Feeding colors in this fixed order keeps indices reproducible.
#[must_use]
pub fn assign_palette(buckets: &[ModelBucket], palette: &mut PaletteBuilder) -> Vec<Model> {
    buckets
        .iter()
        .map(|bucket| Model {
            size: bucket.size,
            offset: bucket.offset,
            voxels: bucket
                .voxels
                .iter()
                .map(|v| ModelVoxel {
                    x: v.local[0],
                    y: v.local[1],
                    z: v.local[2],
                    color_index: palette.lookup(v.color),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::voxelizer::VoxelPosition;

    const RED: Color = Color::new(255, 0, 0);

    fn line_x(len: i32, start: VoxelPosition) -> VoxelGrid {
        (0..len)
            .map(|i| (VoxelPosition::new(start.x + i, start.y, start.z), RED))
            .collect()
    }

    #[test]
    fn test_empty_grid_is_empty_result() {
        let err = partition(&VoxelGrid::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResult);
    }

    #[test]
    fn test_single_bucket_normalized_to_origin() {
        let grid: VoxelGrid = [
            (VoxelPosition::new(-5, 10, 3), RED),
            (VoxelPosition::new(-3, 12, 3), RED),
        ]
        .into_iter()
        .collect();

        let buckets = partition(&grid).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].size, [3, 3, 1]);
        assert_eq!(buckets[0].offset, [0, 0, 0]);
        assert_eq!(buckets[0].voxels[0].local, [0, 0, 0]);
        assert_eq!(buckets[0].voxels[1].local, [2, 2, 0]);
    }

    #[test]
    fn test_300_long_line_splits_into_256_and_44() {
        let buckets = partition(&line_x(300, VoxelPosition::new(-40, 7, 7))).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].size, [256, 1, 1]);
        assert_eq!(buckets[0].offset, [0, 0, 0]);
        assert_eq!(buckets[1].size, [44, 1, 1]);
        assert_eq!(buckets[1].offset, [256, 0, 0]);
        assert_eq!(buckets[1].voxels[0].local, [0, 0, 0]);
        assert_eq!(buckets[1].voxels.len(), 44);
    }

    #[test]
    fn test_buckets_in_lexicographic_key_order() {
        let grid: VoxelGrid = [
            (VoxelPosition::new(0, 0, 0), RED),
            (VoxelPosition::new(300, 0, 0), RED),
            (VoxelPosition::new(0, 0, 300), RED),
            (VoxelPosition::new(0, 300, 0), RED),
            (VoxelPosition::new(300, 300, 300), RED),
        ]
        .into_iter()
        .collect();

        let keys: Vec<[u32; 3]> = partition(&grid).unwrap().iter().map(|b| b.key).collect();
        assert_eq!(
            keys,
            vec![[0, 0, 0], [0, 0, 1], [0, 1, 0], [1, 0, 0], [1, 1, 1]]
        );
    }

    #[test]
    fn test_sizes_never_exceed_limit() {
        let grid: VoxelGrid = (0..600)
            .map(|i| (VoxelPosition::new(i, i / 2, 1000 - i), RED))
            .collect();
        for bucket in partition(&grid).unwrap() {
            assert!(bucket.size.iter().all(|&s| (1..=MAX_MODEL_SIZE).contains(&s)));
            for v in &bucket.voxels {
                for axis in 0..3 {
                    assert!(u32::from(v.local[axis]) < bucket.size[axis]);
                }
            }
        }
    }

    #[test]
    fn test_assign_palette_in_model_order() {
        let mut grid = line_x(300, VoxelPosition::new(0, 0, 0));
        grid.insert(VoxelPosition::new(299, 0, 0), Color::new(0, 0, 255));

        let buckets = partition(&grid).unwrap();
        let mut palette = PaletteBuilder::new();
        let models = assign_palette(&buckets, &mut palette);

        assert_eq!(models.len(), 2);
        assert!(models[0].voxels.iter().all(|v| v.color_index == 1));
        assert_eq!(models[1].voxels.last().map(|v| v.color_index), Some(2));
        assert!(models[0].at_origin());
        assert!(!models[1].at_origin());
    }
}
