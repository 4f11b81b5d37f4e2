//! Chunk primitive.
//!
//! ```text
//! [4 bytes: ASCII id]
//! [4 bytes: content size N, LE]
//! [4 bytes: children size M, LE]
//! [N bytes: content]
//! [M bytes: children]
//! ```
//!
//! Every chunk this crate writes except `MAIN` is a leaf (M = 0).

use crate::scene::Dict;

/// Bytes before a chunk's content.
pub const CHUNK_HEADER_LEN: usize = 12;

/// Chunk ids used by the writer and reader.
pub mod ids {
    /// Top-level container.
    pub const MAIN: [u8; 4] = *b"MAIN";
    /// Model count (multi-model files only).
    pub const PACK: [u8; 4] = *b"PACK";
    /// Model extent.
    pub const SIZE: [u8; 4] = *b"SIZE";
    /// Model voxels.
    pub const XYZI: [u8; 4] = *b"XYZI";
    /// Palette.
    pub const RGBA: [u8; 4] = *b"RGBA";
    /// Transform node.
    pub const TRANSFORM: [u8; 4] = *b"nTRN";
    /// Group node.
    pub const GROUP: [u8; 4] = *b"nGRP";
    /// Shape node.
    pub const SHAPE: [u8; 4] = *b"nSHP";
}

/// A leaf chunk with its content fully built in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// ASCII id.
    pub id: [u8; 4],
    /// Content bytes.
    pub content: Vec<u8>,
}

impl Chunk {
    /// Creates a chunk.
    #[must_use]
    pub fn new(id: [u8; 4], content: Vec<u8>) -> Self {
        Self { id, content }
    }

    /// Header plus content length.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        CHUNK_HEADER_LEN + self.content.len()
    }

    /// Appends header and content to `out`.
    ///
    /// Content length must fit a u32; the writer checks totals before calling.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.content);
    }
}

/// Little-endian content builder.
#[derive(Debug, Default)]
pub struct ContentWriter {
    buf: Vec<u8>,
}

impl ContentWriter {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Appends a u32.
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends an i32.
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends raw bytes.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Appends a length-prefixed string.
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.u32(value.len() as u32).bytes(value.as_bytes())
    }

    /// Appends a dictionary: entry count, then (key, value) strings.
    pub fn dict(&mut self, dict: &Dict) -> &mut Self {
        self.u32(dict.len() as u32);
        for (key, value) in dict.iter() {
            self.string(key).string(value);
        }
        self
    }

    /// Finishes into a chunk.
    #[must_use]
    pub fn into_chunk(self, id: [u8; 4]) -> Chunk {
        Chunk::new(id, self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_layout() {
        let mut w = ContentWriter::new();
        w.u32(7);
        let chunk = w.into_chunk(ids::PACK);

        let mut out = Vec::new();
        chunk.write_into(&mut out);
        assert_eq!(chunk.encoded_len(), 16);
        assert_eq!(out, b"PACK\x04\x00\x00\x00\x00\x00\x00\x00\x07\x00\x00\x00");
    }

    #[test]
    fn test_empty_dict_is_length_prefixed() {
        let mut w = ContentWriter::new();
        w.dict(&Dict::new());
        assert_eq!(w.into_chunk(ids::SHAPE).content, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_dict_encoding() {
        let dict: Dict = [("_t", "1 2 3")].into_iter().collect();
        let mut w = ContentWriter::new();
        w.dict(&dict);

        let mut expected = Vec::new();
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"_t");
        expected.extend_from_slice(&5u32.to_le_bytes());
        expected.extend_from_slice(b"1 2 3");
        assert_eq!(w.into_chunk(ids::TRANSFORM).content, expected);
    }
}
