//! Chunk encoder and file assembler.
//!
//! ## Stream layout
//!
//! ```text
//! "VOX " | 150u32
//! MAIN (content 0, children = Σ (12 + content) of everything below)
//! ├── PACK          only when there is more than one model
//! ├── SIZE, XYZI    per model, model order
//! ├── RGBA          256 × RGBA
//! ├── nTRN 0        root transform
//! ├── nGRP 1        root group
//! └── nTRN/nSHP     per model
//! ```
//!
//! Every chunk is built in memory first, so the MAIN children size is known
//! before the first byte goes out. No seeking, no patching.

use std::io::Write;

use crate::error::{ExportError, ExportResult};
use crate::palette::PALETTE_TABLE_LEN;
use crate::partition::Model;
use crate::scene::{format_translation, Dict, SceneNode, TRANSLATION_KEY};

use super::chunk::{ids, Chunk, ContentWriter, CHUNK_HEADER_LEN};

/// File magic.
pub const VOX_MAGIC: [u8; 4] = *b"VOX ";

/// Format version written by this crate.
pub const VOX_VERSION: u32 = 150;

/// Reserved id / layer id value meaning "none".
pub const NO_ID: i32 = -1;

/// Builds the ordered list of MAIN children.
#[must_use]
pub fn encode_chunks(
    models: &[Model],
    palette: &[[u8; 4]; PALETTE_TABLE_LEN],
    nodes: &[SceneNode],
) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(2 + models.len() * 2 + nodes.len());

    if models.len() > 1 {
        let mut pack = ContentWriter::new();
        pack.u32(models.len() as u32);
        chunks.push(pack.into_chunk(ids::PACK));
    }

    for model in models {
        chunks.push(size_chunk(model));
        chunks.push(xyzi_chunk(model));
    }

    chunks.push(rgba_chunk(palette));
    chunks.extend(nodes.iter().map(node_chunk));
    chunks
}

fn size_chunk(model: &Model) -> Chunk {
    let mut w = ContentWriter::with_capacity(12);
    w.u32(model.size[0]).u32(model.size[1]).u32(model.size[2]);
    w.into_chunk(ids::SIZE)
}

fn xyzi_chunk(model: &Model) -> Chunk {
    let mut w = ContentWriter::with_capacity(4 + model.voxels.len() * 4);
    w.u32(model.voxels.len() as u32)
        .bytes(bytemuck::cast_slice(&model.voxels));
    w.into_chunk(ids::XYZI)
}

fn rgba_chunk(palette: &[[u8; 4]; PALETTE_TABLE_LEN]) -> Chunk {
    let mut w = ContentWriter::with_capacity(PALETTE_TABLE_LEN * 4);
    w.bytes(bytemuck::cast_slice(&palette[..]));
    w.into_chunk(ids::RGBA)
}

fn node_chunk(node: &SceneNode) -> Chunk {
    let mut w = ContentWriter::new();
    match node {
        SceneNode::Transform {
            id,
            child_id,
            translation,
            attributes,
        } => {
            let mut frame = Dict::new();
            if let Some(t) = translation {
                frame.insert(TRANSLATION_KEY, format_translation(*t));
            }
            w.u32(*id)
                .dict(attributes)
                .u32(*child_id)
                .i32(NO_ID) // reserved
                .i32(NO_ID) // layer
                .u32(1)
                .dict(&frame);
            w.into_chunk(ids::TRANSFORM)
        }
        SceneNode::Group { id, child_ids } => {
            w.u32(*id).dict(&Dict::new()).u32(child_ids.len() as u32);
            for child in child_ids {
                w.u32(*child);
            }
            w.into_chunk(ids::GROUP)
        }
        SceneNode::Shape { id, model_index } => {
            w.u32(*id)
                .dict(&Dict::new())
                .u32(1)
                .u32(*model_index)
                .dict(&Dict::new());
            w.into_chunk(ids::SHAPE)
        }
    }
}

/// Sum of `12 + content` over `chunks`, checked against the u32 size field.
///
/// # Errors
///
/// [`ExportError::InvalidParameter`] if the scene does not fit one file.
pub fn children_size(chunks: &[Chunk]) -> ExportResult<u32> {
    let total: usize = chunks.iter().map(Chunk::encoded_len).sum();
    u32::try_from(total).map_err(|_| {
        ExportError::invalid(format!(
            "scene needs {total} bytes of chunk data, the format caps MAIN at {} bytes",
            u32::MAX
        ))
    })
}

/// Assembles header, MAIN and `chunks` into one buffer.
///
/// # Errors
///
/// See [`children_size`].
pub fn assemble(chunks: &[Chunk]) -> ExportResult<Vec<u8>> {
    let children = children_size(chunks)?;
    let mut out = Vec::with_capacity(8 + CHUNK_HEADER_LEN + children as usize);

    out.extend_from_slice(&VOX_MAGIC);
    out.extend_from_slice(&VOX_VERSION.to_le_bytes());
    out.extend_from_slice(&ids::MAIN);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&children.to_le_bytes());
    for chunk in chunks {
        chunk.write_into(&mut out);
    }

    Ok(out)
}

/// Streams an assembled file to `writer`.
///
/// # Errors
///
/// Propagates I/O errors from `writer`.
pub fn write_all<W: Write>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes)?;
    writer.flush()
}
