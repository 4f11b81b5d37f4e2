//! # voxelbake
//!
//! Turns triangle meshes into colored voxels and writes them as MagicaVoxel
//! `.vox` (v150) files.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EXPORT PIPELINE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MeshSnapshot → Color Sampler → Voxelizer → VoxelGrid       │
//! │       ↓                                        ↓            │
//! │  Palette Builder ← assign_palette ← Partitioner (256³)      │
//! │       ↓                                                     │
//! │  Scene Graph → Chunk Encoder → MAIN → .vox bytes            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Same snapshot, same options: byte-identical output
//! - Parallel voxelization yields the sequential result
//! - Every model is at most 256 cells per axis
//! - At most 255 palette colors; overflow maps to the nearest entry
//!
//! ## Example
//!
//! ```rust,ignore
//! use voxelbake_core::{export_to_file, ExportOptions, MeshSnapshot};
//!
//! let snapshot = MeshSnapshot::new(triangles, materials);
//! let summary = export_to_file(&snapshot, "out/model.vox", &ExportOptions::default())?;
//! println!("{summary}");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod math;
pub mod mesh;
pub mod palette;
pub mod partition;
pub mod scene;
pub mod vox;
pub mod voxelizer;

pub use color::{sample_face_color, Color};
pub use config::{ConfigError, ExportOptions, DEFAULT_EDGE_LENGTH};
pub use error::{ErrorKind, ExportError, ExportResult};
pub use export::{bake, export_bytes, export_to_file, BakedScene, ExportSummary, VOX_EXTENSION};
pub use math::Vec3;
pub use mesh::{ColoredTriangle, Material, MeshSnapshot, MeshTriangle};
pub use palette::{PaletteBuilder, MAX_PALETTE_COLORS, PALETTE_TABLE_LEN, PLACEHOLDER_RGBA};
pub use partition::{assign_palette, partition, Model, ModelBucket, ModelVoxel, MAX_MODEL_SIZE};
pub use scene::{build_scene_graph, Dict, SceneNode};
pub use vox::{VoxError, VoxModel, VoxReader, VoxScene};
pub use voxelizer::{voxelize, voxelize_parallel, VoxelGrid, VoxelPosition};
