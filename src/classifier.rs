//! Decides whether a freshly received chunk was generated just now or loaded from a save.
//!
//! Freshly generated chunks are sent with palettes in the server's insertion order, so a
//! new overworld or nether chunk's lowest section starts its linear palette with air, and a
//! hash-map palette that still lists entries no block references betrays a section the
//! server filled and then overwrote during generation. In the end, freshly generated chunks
//! list plains first in their biome palette.

use crate::error::{NewChunksError, Result};
use crate::world::registry::PLAINS;
use crate::world::{ChunkColumn, DimensionClass, Palette, Registries};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Number of sections inspected for the hash-map rule.
const HASH_MAP_SCAN_SECTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    New,
    Old,
}

impl Classification {
    fn from_flag(is_new: bool) -> Self {
        if is_new {
            Classification::New
        } else {
            Classification::Old
        }
    }
}

pub struct PaletteClassifier {
    registries: Arc<Registries>,
    scratch: Mutex<HashSet<u32>>,
}

impl PaletteClassifier {
    pub fn new(registries: Arc<Registries>) -> Self {
        Self {
            registries,
            scratch: Mutex::new(HashSet::new()),
        }
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Classifies `column` under the rules of `dimension`.
    ///
    /// Anything the rules cannot decide is `Old`. Malformed section data is an error.
    /// Dimensions without a rule always give `Old`; callers are expected to skip them.
    pub fn classify(
        &self,
        dimension: DimensionClass,
        column: &ChunkColumn,
    ) -> Result<Classification> {
        let is_new = match dimension {
            DimensionClass::Overworld | DimensionClass::Nether => {
                self.check_block_palettes(column)?
            }
            DimensionClass::End => self.check_biome_palette(column)?,
            DimensionClass::Other => false,
        };
        Ok(Classification::from_flag(is_new))
    }

    fn check_block_palettes(&self, column: &ChunkColumn) -> Result<bool> {
        let lowest = match column.lowest_section() {
            Some(section) => section,
            None => return Ok(false),
        };
        let palette = lowest.states.palette();
        if palette.size() == 0 {
            return Ok(false);
        }
        match palette {
            Palette::Linear(_) => Ok(self.registries.blocks.is_air(palette.value_for(0)?)),
            Palette::HashMap(_) => self.has_unreferenced_entries(column),
            _ => Ok(false),
        }
    }

    fn has_unreferenced_entries(&self, column: &ChunkColumn) -> Result<bool> {
        let mut referenced = self.scratch.lock();
        for section in column.sections.iter().take(HASH_MAP_SCAN_SECTIONS) {
            let container = &section.states;
            let palette = container.palette();
            if !matches!(palette, Palette::Linear(_) | Palette::HashMap(_)) || palette.size() == 0
            {
                continue;
            }
            referenced.clear();
            let mut out_of_range = None;
            container.storage().for_each(|index| {
                if index as usize >= palette.size() {
                    out_of_range.get_or_insert(index);
                }
                referenced.insert(index);
            });
            if let Some(index) = out_of_range {
                return Err(NewChunksError::PaletteError(format!(
                    "storage references index {} of a {} entry palette",
                    index,
                    palette.size()
                )));
            }
            if palette.size() > referenced.len() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_biome_palette(&self, column: &ChunkColumn) -> Result<bool> {
        let lowest = match column.lowest_section() {
            Some(section) => section,
            None => return Ok(false),
        };
        let palette = lowest.biomes.palette();
        if palette.size() <= 1 {
            return Ok(false);
        }
        let id = palette.value_for(0)?;
        let key = self.registries.biomes.biome_key(id).ok_or_else(|| {
            NewChunksError::PaletteError(format!("unknown biome id {}", id))
        })?;
        Ok(key == PLAINS)
    }
}
