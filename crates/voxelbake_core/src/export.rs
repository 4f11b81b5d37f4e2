//! # Export Pipeline
//!
//! ```text
//! MeshSnapshot
//!   │  sample_face_color        (per face, input order)
//!   ▼
//! ColoredTriangle[] ──► voxelize / voxelize_parallel ──► VoxelGrid
//!                                                           │ partition
//!                                                           ▼
//!                          PaletteBuilder ◄── assign_palette ── ModelBucket[]
//!                                                           │
//!                                                           ▼
//!                         BakedScene { models, palette, nodes } ──► bytes
//! ```
//!
//! Everything up to [`BakedScene`] is pure. Only [`export_to_file`] touches
//! the filesystem.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::ExportOptions;
use crate::error::{ExportError, ExportResult};
use crate::mesh::MeshSnapshot;
use crate::palette::{PaletteBuilder, PALETTE_TABLE_LEN};
use crate::partition::{assign_palette, partition, Model};
use crate::scene::{build_scene_graph, SceneNode};
use crate::vox::{assemble, encode_chunks, write_all};
use crate::voxelizer::{voxelize, voxelize_parallel};

/// Extension required on output paths.
pub const VOX_EXTENSION: &str = "vox";

/// A fully resolved scene, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedScene {
    /// Models in canonical bucket order.
    pub models: Vec<Model>,
    /// The palette the models index into.
    pub palette: PaletteBuilder,
    /// Placement tree for `models`.
    pub nodes: Vec<SceneNode>,
}

impl BakedScene {
    /// Total voxels over all models.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.models.iter().map(|m| m.voxels.len()).sum()
    }

    /// The 256-slot RGBA table written to the file.
    #[must_use]
    pub fn palette_table(&self) -> [[u8; 4]; PALETTE_TABLE_LEN] {
        self.palette.rgba_table()
    }

    /// Encodes the `.vox` stream.
    ///
    /// # Errors
    ///
    /// [`ExportError::InvalidParameter`] if the encoded scene is larger than
    /// the format's 4 GiB chunk limit.
    pub fn encode(&self) -> ExportResult<Vec<u8>> {
        let chunks = encode_chunks(&self.models, &self.palette_table(), &self.nodes);
        assemble(&chunks)
    }

    fn summary(&self, byte_len: usize) -> ExportSummary {
        ExportSummary {
            voxel_count: self.voxel_count(),
            model_count: self.models.len(),
            palette_len: self.palette.len(),
            byte_len,
        }
    }
}

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Voxels written.
    pub voxel_count: usize,
    /// Models written.
    pub model_count: usize,
    /// Distinct palette entries used (1..=255).
    pub palette_len: usize,
    /// Encoded file size.
    pub byte_len: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} voxels in {} model(s)",
            self.voxel_count, self.model_count
        )
    }
}

/// Runs everything except encoding.
///
/// # Errors
///
/// - [`ExportError::InvalidParameter`] for no triangles or a bad edge length
/// - [`ExportError::EmptyResult`] if no voxel was produced
/// - [`ExportError::InternalInvariantViolation`] if partitioning breaks the
///   model size limit
pub fn bake(snapshot: &MeshSnapshot, options: &ExportOptions) -> ExportResult<BakedScene> {
    if snapshot.triangles.is_empty() {
        return Err(ExportError::invalid("mesh snapshot has no triangles"));
    }

    let triangles = snapshot.colored_triangles();
    let grid = if options.parallel {
        voxelize_parallel(&triangles, options.voxel_edge_length)?
    } else {
        voxelize(&triangles, options.voxel_edge_length)?
    };

    let buckets = partition(&grid)?;
    let mut palette = PaletteBuilder::new();
    let models = assign_palette(&buckets, &mut palette);
    let nodes = build_scene_graph(&models);

    if palette.is_full() {
        tracing::warn!(
            "palette is full; further colors were mapped to their nearest entry"
        );
    }
    tracing::debug!(
        models = models.len(),
        colors = palette.len(),
        "baked scene"
    );

    Ok(BakedScene {
        models,
        palette,
        nodes,
    })
}

/// Bakes and encodes in memory.
///
/// # Errors
///
/// See [`bake`] and [`BakedScene::encode`].
pub fn export_bytes(
    snapshot: &MeshSnapshot,
    options: &ExportOptions,
) -> ExportResult<(Vec<u8>, ExportSummary)> {
    let scene = bake(snapshot, options)?;
    let bytes = scene.encode()?;
    let summary = scene.summary(bytes.len());
    Ok((bytes, summary))
}

/// Bakes, encodes and writes `path`, creating parent directories.
///
/// Nothing is created on disk unless the export itself succeeds. The bytes
/// go to a sibling `.tmp` file first and are renamed over `path`, so a
/// failed write never leaves a truncated `.vox` behind.
///
/// # Errors
///
/// - [`ExportError::InvalidParameter`] if `path` does not end in `.vox`
/// - [`ExportError::IoFailure`] if the directory or file cannot be written
/// - anything [`export_bytes`] returns
pub fn export_to_file(
    snapshot: &MeshSnapshot,
    path: impl AsRef<Path>,
    options: &ExportOptions,
) -> ExportResult<ExportSummary> {
    let path = path.as_ref();
    let has_vox_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(VOX_EXTENSION));
    if !has_vox_extension {
        return Err(ExportError::invalid(format!(
            "output path {} must have a .{VOX_EXTENSION} extension",
            path.display()
        )));
    }

    let (bytes, summary) = export_bytes(snapshot, options)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
    }
    let staging = staging_path(path);
    let written = File::create(&staging)
        .and_then(|file| write_all(&mut BufWriter::new(file), &bytes))
        .and_then(|()| std::fs::rename(&staging, path));
    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(&staging) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %staging.display(),
                    "could not remove partial file: {cleanup}"
                );
            }
        }
        return Err(ExportError::io(path, e));
    }

    tracing::info!(path = %path.display(), bytes = summary.byte_len, "{summary}");
    Ok(summary)
}

/// `<path>.tmp`, next to the destination so the rename stays on one filesystem.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
