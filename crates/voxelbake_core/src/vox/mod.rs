//! # MagicaVoxel `.vox` (v150)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        VOX CODEC                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Model[] + palette + SceneNode[] → Chunk[] → MAIN → bytes    │
//! │                                                 ↓            │
//! │  VoxScene ←──────────── VoxReader ←──────── bytes / file     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers little-endian. Strings are a u32 byte length followed by the
//! bytes, no terminator.

mod chunk;
mod reader;
mod writer;

pub use chunk::{ids, Chunk, ContentWriter, CHUNK_HEADER_LEN};
pub use reader::{VoxError, VoxModel, VoxReader, VoxScene};
pub use writer::{assemble, children_size, encode_chunks, write_all, NO_ID, VOX_MAGIC, VOX_VERSION};
