//! Per-table colour schemes.

use std::collections::HashMap;

use hopscotch_types::{RunPalette, TableBase};

/// Session-lifetime cache of one palette per table.
///
/// Hues are random per session; the same table reuses its first palette
/// until the process exits.
#[derive(Debug, Default)]
pub struct PaletteCache {
    palettes: HashMap<TableBase, RunPalette>,
}

impl PaletteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached palette for `base`, generating one on first use.
    pub fn palette_for(&mut self, base: TableBase) -> RunPalette {
        *self
            .palettes
            .entry(base)
            .or_insert_with(|| RunPalette::from_hue(random_hue()))
    }

    #[must_use]
    pub fn get(&self, base: TableBase) -> Option<&RunPalette> {
        self.palettes.get(&base)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

fn random_hue() -> u16 {
    // `random::<f64>()` is in [0, 1), so the hue stays below 360.
    (rand::random::<f64>() * 360.0).floor() as u16 % 360
}
