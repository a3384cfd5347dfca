//! Block state and biome registries needed to interpret palette entries.
//!
//! Palette entries are plain registry ids. The classifier only has to answer two questions
//! about them (is this state air, which biome is this) plus the global palette width,
//! so the registries keep just that.

use crate::error::{NewChunksError, Result};
use crate::world::palette::PaletteStrategy;
use serde::Deserialize;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

pub const AIR: &str = "minecraft:air";
pub const PLAINS: &str = "minecraft:plains";

/// Vanilla biome registry in the order a vanilla server synchronises it.
const VANILLA_BIOMES: [&str; 64] = [
    "badlands",
    "bamboo_jungle",
    "basalt_deltas",
    "beach",
    "birch_forest",
    "cherry_grove",
    "cold_ocean",
    "crimson_forest",
    "dark_forest",
    "deep_cold_ocean",
    "deep_dark",
    "deep_frozen_ocean",
    "deep_lukewarm_ocean",
    "deep_ocean",
    "desert",
    "dripstone_caves",
    "end_barrens",
    "end_highlands",
    "end_midlands",
    "eroded_badlands",
    "flower_forest",
    "forest",
    "frozen_ocean",
    "frozen_peaks",
    "frozen_river",
    "grove",
    "ice_spikes",
    "jagged_peaks",
    "jungle",
    "lukewarm_ocean",
    "lush_caves",
    "mangrove_swamp",
    "meadow",
    "mushroom_fields",
    "nether_wastes",
    "ocean",
    "old_growth_birch_forest",
    "old_growth_pine_taiga",
    "old_growth_spruce_taiga",
    "plains",
    "river",
    "savanna",
    "savanna_plateau",
    "small_end_islands",
    "snowy_beach",
    "snowy_plains",
    "snowy_slopes",
    "snowy_taiga",
    "soul_sand_valley",
    "sparse_jungle",
    "stony_peaks",
    "stony_shore",
    "sunflower_plains",
    "swamp",
    "taiga",
    "the_end",
    "the_void",
    "warm_ocean",
    "warped_forest",
    "windswept_forest",
    "windswept_gravelly_hills",
    "windswept_hills",
    "windswept_savanna",
    "wooded_badlands",
];

/// Vanilla block state count; only its bit width matters for decoding.
const VANILLA_STATE_COUNT: u32 = 24_135;

#[derive(Deserialize, Debug)]
struct BlockEntry {
    name: String,
    #[serde(rename = "minStateId")]
    min_state_id: u32,
    #[serde(rename = "maxStateId")]
    max_state_id: u32,
}

#[derive(Deserialize, Debug)]
struct BiomeEntry {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRegistry {
    air_states: RangeInclusive<u32>,
    state_count: u32,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self {
            air_states: 0..=0,
            state_count: VANILLA_STATE_COUNT,
        }
    }
}

impl BlockRegistry {
    pub fn new(air_states: RangeInclusive<u32>, state_count: u32) -> Self {
        Self {
            air_states,
            state_count,
        }
    }

    /// Parses a minecraft-data style `blocks.json` array.
    pub fn from_json(json: &str) -> Result<Self> {
        let blocks: Vec<BlockEntry> = serde_json::from_str(json)?;
        let air = blocks
            .iter()
            .find(|b| namespaced(&b.name) == AIR)
            .ok_or_else(|| NewChunksError::ConfigError("blocks.json has no air block".to_owned()))?;
        let state_count = blocks
            .iter()
            .map(|b| b.max_state_id + 1)
            .max()
            .unwrap_or(0);
        Ok(Self::new(air.min_state_id..=air.max_state_id, state_count))
    }

    /// Only the plain air block counts; cave and void air do not.
    pub fn is_air(&self, state: u32) -> bool {
        self.air_states.contains(&state)
    }

    pub fn state_count(&self) -> u32 {
        self.state_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiomeRegistry {
    names: Vec<String>,
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::from_names(VANILLA_BIOMES.iter().copied())
    }
}

impl BiomeRegistry {
    /// Builds a registry whose ids follow the iteration order of `names`.
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(|n| namespaced(n.as_ref())).collect(),
        }
    }

    /// Parses a minecraft-data style `biomes.json` array. Ids must be dense.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut biomes: Vec<BiomeEntry> = serde_json::from_str(json)?;
        biomes.sort_by_key(|b| b.id);
        if let Some((i, b)) = biomes.iter().enumerate().find(|(i, b)| b.id as usize != *i) {
            return Err(NewChunksError::ConfigError(format!(
                "biome ids are not dense: expected {} but found {} ({})",
                i, b.id, b.name
            )));
        }
        Ok(Self::from_names(biomes.into_iter().map(|b| b.name)))
    }

    pub fn biome_key(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        let name = namespaced(name);
        self.names.iter().position(|n| *n == name).map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Both registries, as the classifier and the chunk decoder need them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registries {
    pub blocks: BlockRegistry,
    pub biomes: BiomeRegistry,
}

#[derive(Deserialize)]
struct RegistryFiles {
    blocks: String,
    biomes: String,
}

impl Registries {
    pub fn state_strategy(&self) -> PaletteStrategy {
        PaletteStrategy::SectionStates {
            registry_size: self.blocks.state_count(),
        }
    }

    pub fn biome_strategy(&self) -> PaletteStrategy {
        PaletteStrategy::SectionBiomes {
            registry_size: self.biomes.len() as u32,
        }
    }

    /// Loads registries from a JSON manifest `{"blocks": "<path>", "biomes": "<path>"}`.
    /// Relative paths are resolved against the manifest's directory.
    pub fn load(manifest: &Path) -> Result<Self> {
        let files: RegistryFiles = serde_json::from_str(&fs::read_to_string(manifest)?)?;
        let base = manifest.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self {
            blocks: BlockRegistry::from_json(&fs::read_to_string(base.join(files.blocks))?)?,
            biomes: BiomeRegistry::from_json(&fs::read_to_string(base.join(files.biomes))?)?,
        })
    }
}

fn namespaced(name: &str) -> String {
    if name.contains(':') {
        name.to_owned()
    } else {
        format!("minecraft:{}", name)
    }
}
