//! `.vox` reader.
//!
//! Reads back what the writer produces (and the usual MagicaVoxel files):
//!
//! ```text
//! "VOX " | version
//! └── MAIN
//!     ├── PACK          optional
//!     ├── SIZE, XYZI    one pair per model
//!     ├── RGBA          optional
//!     ├── nTRN/nGRP/nSHP
//!     └── anything else is skipped
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

use crate::palette::PALETTE_TABLE_LEN;
use crate::partition::ModelVoxel;
use crate::scene::{parse_translation, Dict, SceneNode, TRANSLATION_KEY};

use super::chunk::ids;
use super::writer::VOX_MAGIC;

/// Oldest and newest versions the reader accepts.
const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u32> = 150..=200;

/// Errors from reading a `.vox` stream.
#[derive(Debug, Error)]
pub enum VoxError {
    /// Underlying I/O failure, including truncated input.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Not a `.vox` stream.
    #[error("invalid VOX format: {0}")]
    InvalidFormat(String),

    /// Version outside the supported range.
    #[error("unsupported VOX version: {0}")]
    UnsupportedVersion(u32),

    /// A required chunk is absent.
    #[error("missing required chunk: {0}")]
    MissingChunk(&'static str),

    /// A chunk's content is malformed.
    #[error("invalid chunk: {0}")]
    InvalidChunk(String),
}

/// One model as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxModel {
    /// Extent per axis.
    pub size: [u32; 3],
    /// Voxels in file order.
    pub voxels: Vec<ModelVoxel>,
}

/// Parsed `.vox` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxScene {
    /// Version from the header.
    pub version: u32,
    /// `PACK` model count, if present.
    pub pack_count: Option<u32>,
    /// Models in SIZE/XYZI order.
    pub models: Vec<VoxModel>,
    /// Palette table exactly as written; slot `k` is palette index `k`.
    pub palette: Option<[[u8; 4]; PALETTE_TABLE_LEN]>,
    /// Scene nodes in file order.
    pub nodes: Vec<SceneNode>,
}

impl VoxScene {
    /// Total voxels over all models.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.models.iter().map(|m| m.voxels.len()).sum()
    }

    /// Translation of model `index`, resolved through the shape and transform
    /// nodes that place it. A transform without `_t` is at the origin.
    ///
    /// `None` if no shape node references the model.
    #[must_use]
    pub fn model_offset(&self, index: u32) -> Option<[i64; 3]> {
        let shape_id = self.nodes.iter().find_map(|node| match node {
            SceneNode::Shape { id, model_index } if *model_index == index => Some(*id),
            _ => None,
        })?;

        self.nodes.iter().find_map(|node| match node {
            SceneNode::Transform {
                child_id,
                translation,
                ..
            } if *child_id == shape_id => Some(translation.unwrap_or([0, 0, 0])),
            _ => None,
        })
    }

    /// Palette color for `color_index`, if the file has a palette.
    #[must_use]
    pub fn color_of(&self, color_index: u8) -> Option<[u8; 4]> {
        self.palette.map(|table| table[usize::from(color_index)])
    }
}

/// `.vox` file reader.
pub struct VoxReader;

impl VoxReader {
    /// Reads a `.vox` file from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or has invalid format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<VoxScene, VoxError> {
        let file = File::open(path.as_ref())?;
        let mut reader = io::BufReader::new(file);
        Self::parse(&mut reader)
    }

    /// Reads a `.vox` stream from memory.
    ///
    /// # Errors
    ///
    /// Returns error if the data has invalid format.
    pub fn load_from_bytes(data: &[u8]) -> Result<VoxScene, VoxError> {
        let mut cursor = io::Cursor::new(data);
        Self::parse(&mut cursor)
    }

    fn parse<R: Read + Seek>(reader: &mut R) -> Result<VoxScene, VoxError> {
        let magic = read_chunk_id(reader)?;
        if magic != VOX_MAGIC {
            return Err(VoxError::InvalidFormat(format!(
                "expected 'VOX ', got '{}'",
                String::from_utf8_lossy(&magic)
            )));
        }

        let version = read_u32(reader)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(VoxError::UnsupportedVersion(version));
        }

        if read_chunk_id(reader)? != ids::MAIN {
            return Err(VoxError::InvalidFormat("expected MAIN chunk".to_string()));
        }
        let main_content_size = read_u32(reader)?;
        let main_children_size = read_u32(reader)?;
        reader.seek(SeekFrom::Current(i64::from(main_content_size)))?;

        let mut scene = VoxScene {
            version,
            pack_count: None,
            models: Vec::new(),
            palette: None,
            nodes: Vec::new(),
        };
        let mut pending_size: Option<[u32; 3]> = None;

        let end_pos = reader.stream_position()? + u64::from(main_children_size);
        while reader.stream_position()? < end_pos {
            let chunk_id = read_chunk_id(reader)?;
            let content_size = read_u32(reader)?;
            let children_size = read_u32(reader)?;
            let chunk_end = reader.stream_position()?
                + u64::from(content_size)
                + u64::from(children_size);
            if chunk_end > end_pos {
                return Err(VoxError::InvalidChunk(format!(
                    "{} chunk runs {} byte(s) past MAIN",
                    String::from_utf8_lossy(&chunk_id),
                    chunk_end - end_pos
                )));
            }

            let mut content = vec![0u8; content_size as usize];
            reader.read_exact(&mut content)?;
            reader.seek(SeekFrom::Current(i64::from(children_size)))?;
            let mut c = ContentReader::new(&chunk_id, &content);

            match chunk_id {
                ids::PACK => scene.pack_count = Some(c.u32()?),
                ids::SIZE => {
                    if pending_size.is_some() {
                        return Err(VoxError::MissingChunk("XYZI"));
                    }
                    pending_size = Some([c.u32()?, c.u32()?, c.u32()?]);
                }
                ids::XYZI => {
                    let size = pending_size
                        .take()
                        .ok_or_else(|| VoxError::InvalidChunk("XYZI before SIZE".to_string()))?;
                    let voxels = parse_voxels(&mut c, size)?;
                    scene.models.push(VoxModel { size, voxels });
                }
                ids::RGBA => {
                    let bytes = c.take(PALETTE_TABLE_LEN * 4)?;
                    let mut table = [[0u8; 4]; PALETTE_TABLE_LEN];
                    for (slot, rgba) in table.iter_mut().zip(bytes.chunks_exact(4)) {
                        slot.copy_from_slice(rgba);
                    }
                    scene.palette = Some(table);
                }
                ids::TRANSFORM => scene.nodes.push(parse_transform(&mut c)?),
                ids::GROUP => {
                    let id = c.u32()?;
                    c.dict()?;
                    let count = c.u32()?;
                    let child_ids: Vec<u32> =
                        (0..count).map(|_| c.u32()).collect::<Result<_, _>>()?;
                    scene.nodes.push(SceneNode::Group { id, child_ids });
                }
                ids::SHAPE => {
                    let id = c.u32()?;
                    c.dict()?;
                    if c.u32()? == 0 {
                        return Err(VoxError::InvalidChunk(format!("nSHP {id} has no model")));
                    }
                    let model_index = c.u32()?;
                    scene.nodes.push(SceneNode::Shape { id, model_index });
                }
                _ => {
                    tracing::trace!(
                        chunk = %String::from_utf8_lossy(&chunk_id),
                        content_size,
                        "skipping chunk"
                    );
                }
            }
        }

        if pending_size.is_some() {
            return Err(VoxError::MissingChunk("XYZI"));
        }
        if scene.models.is_empty() {
            return Err(VoxError::MissingChunk("SIZE"));
        }

        Ok(scene)
    }
}

fn parse_voxels(c: &mut ContentReader<'_>, size: [u32; 3]) -> Result<Vec<ModelVoxel>, VoxError> {
    let count = c.u32()? as usize;
    let bytes = c.take(count * 4)?;
    let voxels: Vec<ModelVoxel> = bytemuck::cast_slice::<u8, ModelVoxel>(bytes).to_vec();

    if let Some(v) = voxels.iter().find(|v| {
        u32::from(v.x) >= size[0] || u32::from(v.y) >= size[1] || u32::from(v.z) >= size[2]
    }) {
        return Err(VoxError::InvalidChunk(format!(
            "voxel ({}, {}, {}) outside model size {size:?}",
            v.x, v.y, v.z
        )));
    }
    Ok(voxels)
}

fn parse_transform(c: &mut ContentReader<'_>) -> Result<SceneNode, VoxError> {
    let id = c.u32()?;
    let attributes = c.dict()?;
    let child_id = c.u32()?;
    let _reserved = c.i32()?;
    let _layer = c.i32()?;
    let frame_count = c.u32()?;

    let mut translation = None;
    for frame_index in 0..frame_count {
        let frame = c.dict()?;
        if frame_index > 0 {
            continue;
        }
        if let Some(value) = frame.get(TRANSLATION_KEY) {
            translation = Some(parse_translation(value).ok_or_else(|| {
                VoxError::InvalidChunk(format!("nTRN {id}: bad translation '{value}'"))
            })?);
        }
    }

    Ok(SceneNode::Transform {
        id,
        child_id,
        translation,
        attributes,
    })
}

/// Bounds-checked cursor over one chunk's content.
struct ContentReader<'a> {
    chunk: [u8; 4],
    data: &'a [u8],
}

impl<'a> ContentReader<'a> {
    fn new(chunk: &[u8; 4], data: &'a [u8]) -> Self {
        Self { chunk: *chunk, data }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], VoxError> {
        if self.data.len() < len {
            return Err(VoxError::InvalidChunk(format!(
                "{} content truncated: needed {len} more bytes, {} left",
                String::from_utf8_lossy(&self.chunk),
                self.data.len()
            )));
        }
        let (head, rest) = self.data.split_at(len);
        self.data = rest;
        Ok(head)
    }

    fn u32(&mut self) -> Result<u32, VoxError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, VoxError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String, VoxError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| VoxError::InvalidChunk(format!("non UTF-8 string: {e}")))
    }

    fn dict(&mut self) -> Result<Dict, VoxError> {
        let count = self.u32()?;
        let mut dict = Dict::new();
        for _ in 0..count {
            let key = self.string()?;
            let value = self.string()?;
            dict.insert(key, value);
        }
        Ok(dict)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, VoxError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_chunk_id<R: Read>(reader: &mut R) -> Result<[u8; 4], VoxError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
