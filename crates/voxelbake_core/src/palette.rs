//! Palette quantization.
//!
//! The format stores colors in a 256-slot table and voxels reference them by
//! an 8-bit index. Index 0 means "no voxel", which leaves 255 usable slots.
//!
//! Colors are assigned slots first-come first-served. Once all 255 are taken,
//! a new color maps to the nearest stored color (squared RGB distance,
//! earliest insertion on ties). Nothing is evicted.

use std::collections::HashMap;

use crate::color::Color;

/// Number of assignable palette slots (indices 1..=255).
pub const MAX_PALETTE_COLORS: usize = 255;

/// Slots in the encoded RGBA table.
pub const PALETTE_TABLE_LEN: usize = 256;

/// Fill for slot 0 and every slot never assigned.
pub const PLACEHOLDER_RGBA: [u8; 4] = [128, 128, 128, 255];

/// Builds the palette incrementally while voxels are encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteBuilder {
    /// Stored colors in insertion order; `colors[i]` has palette index `i + 1`.
    colors: Vec<Color>,
    /// Exact-match lookup.
    index_of: HashMap<Color, u8>,
}

impl PaletteBuilder {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: Vec::with_capacity(MAX_PALETTE_COLORS),
            index_of: HashMap::with_capacity(MAX_PALETTE_COLORS),
        }
    }

    /// Returns the palette index (1..=255) for `color`, assigning a slot if
    /// one is free.
    ///
    /// Repeated calls with the same color always return the same index.
    pub fn lookup(&mut self, color: Color) -> u8 {
        if let Some(&index) = self.index_of.get(&color) {
            return index;
        }

        if self.colors.len() < MAX_PALETTE_COLORS {
            self.colors.push(color);
            let index = self.colors.len() as u8;
            self.index_of.insert(color, index);
            return index;
        }

        self.nearest(color)
    }

    /// Index of the stored color closest to `color`. Earliest wins ties.
    fn nearest(&self, color: Color) -> u8 {
        let mut best_index = 1u8;
        let mut best_distance = u32::MAX;
        for (slot, stored) in self.colors.iter().enumerate() {
            let distance = stored.distance_squared(color);
            if distance < best_distance {
                best_distance = distance;
                best_index = (slot + 1) as u8;
            }
        }
        best_index
    }

    /// Number of stored colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True if no color has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// True once all 255 slots are taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.colors.len() == MAX_PALETTE_COLORS
    }

    /// Stored colors; position `i` has palette index `i + 1`.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color stored at a 1-based palette index.
    #[must_use]
    pub fn color_at(&self, index: u8) -> Option<Color> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|slot| self.colors.get(slot).copied())
    }

    /// The 256-entry RGBA table, indexed by palette index.
    ///
    /// Slot 0 and unassigned slots hold [`PLACEHOLDER_RGBA`].
    #[must_use]
    pub fn rgba_table(&self) -> [[u8; 4]; PALETTE_TABLE_LEN] {
        let mut table = [PLACEHOLDER_RGBA; PALETTE_TABLE_LEN];
        for (slot, color) in self.colors.iter().enumerate() {
            table[slot + 1] = color.to_rgba();
        }
        table
    }
}
