//! Section and column builders shared by the unit tests.

use crate::world::registry::PLAINS;
use crate::world::{
    BitStorage, ChunkColumn, ChunkPos, ChunkSection, Palette, PalettedContainer, Registries,
};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const AIR: u32 = 0;
pub const STONE: u32 = 1;

pub fn plains_id() -> u32 {
    Registries::default().biomes.id_of(PLAINS).unwrap()
}

fn cycling_indices(distinct: usize, cells: usize) -> Vec<u32> {
    (0..cells).map(|i| (i % distinct.max(1)) as u32).collect()
}

fn plains_biomes() -> PalettedContainer {
    PalettedContainer::single(Registries::default().biome_strategy(), plains_id())
}

/// Section whose block states use an indirect palette of `entries`, with the first
/// `distinct` entries referenced by the storage.
pub fn indirect_section(entries: Vec<u32>, distinct: usize) -> ChunkSection {
    let strategy = Registries::default().state_strategy();
    let indices = cycling_indices(distinct, strategy.size());
    ChunkSection {
        block_count: 4096,
        states: PalettedContainer::indirect(strategy, entries, &indices).unwrap(),
        biomes: plains_biomes(),
    }
}

/// Section with a hash-map palette of `size` entries of which `distinct` are referenced.
pub fn hash_map_section(size: u32, distinct: usize) -> ChunkSection {
    let indices = cycling_indices(distinct, 4096);
    ChunkSection {
        block_count: 4096,
        states: PalettedContainer::new(
            Palette::HashMap((1..=size).collect()),
            BitStorage::from_values(5, &indices).unwrap(),
        ),
        biomes: plains_biomes(),
    }
}

pub fn single_value_section(state: u32) -> ChunkSection {
    ChunkSection {
        block_count: 0,
        states: PalettedContainer::single(Registries::default().state_strategy(), state),
        biomes: plains_biomes(),
    }
}

/// Air-only section whose biome palette holds `biomes`, all of them referenced.
pub fn biome_section(biomes: Vec<u32>) -> ChunkSection {
    let strategy = Registries::default().biome_strategy();
    let biomes = if biomes.len() == 1 {
        PalettedContainer::single(strategy, biomes[0])
    } else {
        let indices = cycling_indices(biomes.len(), strategy.size());
        PalettedContainer::indirect(strategy, biomes, &indices).unwrap()
    };
    ChunkSection {
        block_count: 0,
        states: PalettedContainer::single(Registries::default().state_strategy(), AIR),
        biomes,
    }
}

pub fn column(x: i32, z: i32, sections: Vec<ChunkSection>) -> ChunkColumn {
    ChunkColumn::new(ChunkPos::new(x, z), sections)
}

/// Overworld column that classifies as new.
pub fn new_column(x: i32, z: i32) -> ChunkColumn {
    column(x, z, vec![indirect_section(vec![AIR, STONE], 2)])
}

/// Overworld column that classifies as old.
pub fn old_column(x: i32, z: i32) -> ChunkColumn {
    column(x, z, vec![indirect_section(vec![STONE, AIR], 2)])
}

/// Empty directory under the system temp dir, unique per call.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seed = format!("{}-{}-{}", name, std::process::id(), nanos);
    let dir = std::env::temp_dir()
        .join("newchunks-tests")
        .join(Uuid::new_v3(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string());
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Overworld column whose storage points past the end of its hash-map palette.
pub fn malformed_column(x: i32, z: i32) -> ChunkColumn {
    let indices: Vec<u32> = (0..4096).map(|i| (i % 8) as u32).collect();
    let section = ChunkSection {
        block_count: 4096,
        states: PalettedContainer::new(
            Palette::HashMap(vec![1, 2, 3, 4, 5]),
            BitStorage::from_values(5, &indices).unwrap(),
        ),
        biomes: plains_biomes(),
    };
    column(x, z, vec![section])
}
