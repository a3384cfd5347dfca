//! Paletted containers as the client holds them after decoding a chunk packet.
//!
//! A container maps every cell of a section (4096 block states or 64 biome cells) to a
//! small palette index stored in a [`BitStorage`]. The palette resolves those indices to
//! registry ids. Which palette representation the client builds depends only on the number
//! of bits per entry the server sent, see [`PaletteStrategy::configuration`].

use crate::error::{NewChunksError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    SingleValue,
    Linear,
    HashMap,
    Global,
}

/// Palette representation, tagged by kind.
///
/// `Linear` and `HashMap` both keep their entries in the order the server sent them. The
/// distinction matters because the server only builds a hash-map palette once a section
/// has seen more than 16 distinct values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    SingleValue(Option<u32>),
    Linear(Vec<u32>),
    HashMap(Vec<u32>),
    /// Storage holds registry ids directly.
    Global { size: u32 },
}

impl Palette {
    pub fn kind(&self) -> PaletteKind {
        match self {
            Palette::SingleValue(_) => PaletteKind::SingleValue,
            Palette::Linear(_) => PaletteKind::Linear,
            Palette::HashMap(_) => PaletteKind::HashMap,
            Palette::Global { .. } => PaletteKind::Global,
        }
    }

    /// Number of declared entries.
    pub fn size(&self) -> usize {
        match self {
            Palette::SingleValue(value) => value.is_some() as usize,
            Palette::Linear(entries) | Palette::HashMap(entries) => entries.len(),
            Palette::Global { size } => *size as usize,
        }
    }

    /// Registry id stored at palette index `index`.
    pub fn value_for(&self, index: u32) -> Result<u32> {
        let value = match self {
            Palette::SingleValue(value) => value.filter(|_| index == 0),
            Palette::Linear(entries) | Palette::HashMap(entries) => {
                entries.get(index as usize).copied()
            }
            Palette::Global { size } => Some(index).filter(|i| i < size),
        };
        value.ok_or_else(|| {
            NewChunksError::PaletteError(format!(
                "missing {:?} palette entry for index {}",
                self.kind(),
                index
            ))
        })
    }

    /// Entries as sent on the wire, for indirect palettes.
    pub fn entries(&self) -> &[u32] {
        match self {
            Palette::Linear(entries) | Palette::HashMap(entries) => entries,
            _ => &[],
        }
    }
}

/// Fixed-width packed integers. Entries never straddle two longs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStorage {
    bits: u8,
    size: usize,
    data: Vec<u64>,
}

impl BitStorage {
    /// Wraps `data` as `size` entries of `bits` width. A zero-bit storage holds no longs and
    /// reads back 0 for every entry.
    pub fn new(bits: u8, size: usize, data: Vec<u64>) -> Result<Self> {
        if bits > 32 {
            return Err(NewChunksError::PaletteError(format!(
                "unsupported storage width of {} bits",
                bits
            )));
        }
        let expected = Self::long_count(bits, size);
        if data.len() != expected {
            return Err(NewChunksError::PaletteError(format!(
                "invalid storage length {} for {} entries of {} bits, expected {}",
                data.len(),
                size,
                bits,
                expected
            )));
        }
        Ok(Self { bits, size, data })
    }

    /// Packs `values` at `bits` per entry.
    pub fn from_values(bits: u8, values: &[u32]) -> Result<Self> {
        let mut data = vec![0u64; Self::long_count(bits, values.len())];
        if bits > 0 {
            let per_long = 64 / bits as usize;
            let mask = Self::mask(bits);
            for (i, &value) in values.iter().enumerate() {
                if value as u64 > mask {
                    return Err(NewChunksError::PaletteError(format!(
                        "value {} does not fit in {} bits",
                        value, bits
                    )));
                }
                let offset = (i % per_long) * bits as usize;
                data[i / per_long] |= (value as u64) << offset;
            }
        }
        Self::new(bits, values.len(), data)
    }

    pub fn long_count(bits: u8, size: usize) -> usize {
        if bits == 0 {
            return 0;
        }
        let per_long = 64 / bits as usize;
        size.div_ceil(per_long)
    }

    fn mask(bits: u8) -> u64 {
        (1u64 << bits) - 1
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn raw(&self) -> &[u64] {
        &self.data
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        if index >= self.size {
            return None;
        }
        if self.bits == 0 {
            return Some(0);
        }
        let per_long = 64 / self.bits as usize;
        let offset = (index % per_long) * self.bits as usize;
        Some(((self.data[index / per_long] >> offset) & Self::mask(self.bits)) as u32)
    }

    /// Calls `f` with every stored entry in index order.
    pub fn for_each(&self, mut f: impl FnMut(u32)) {
        if self.bits == 0 {
            (0..self.size).for_each(|_| f(0));
            return;
        }
        let per_long = 64 / self.bits as usize;
        let mask = Self::mask(self.bits);
        let mut remaining = self.size;
        for &long in &self.data {
            let mut long = long;
            for _ in 0..per_long.min(remaining) {
                f((long & mask) as u32);
                long >>= self.bits;
            }
            remaining = remaining.saturating_sub(per_long);
        }
    }
}

/// How a container decides its palette representation from the bits per entry.
/// `registry_size` is the number of ids in the backing registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteStrategy {
    /// 16x16x16 block states.
    SectionStates { registry_size: u32 },
    /// 4x4x4 biome cells.
    SectionBiomes { registry_size: u32 },
}

impl PaletteStrategy {
    pub fn size(&self) -> usize {
        match self {
            PaletteStrategy::SectionStates { .. } => 4096,
            PaletteStrategy::SectionBiomes { .. } => 64,
        }
    }

    pub fn registry_size(&self) -> u32 {
        match *self {
            PaletteStrategy::SectionStates { registry_size }
            | PaletteStrategy::SectionBiomes { registry_size } => registry_size,
        }
    }

    /// Width of a global palette entry.
    pub fn global_bits(&self) -> u8 {
        ceil_log2(self.registry_size())
    }

    /// Palette kind and storage width the client uses for `bits` sent by the server.
    pub fn configuration(&self, bits: u8) -> (PaletteKind, u8) {
        match self {
            PaletteStrategy::SectionStates { .. } => match bits {
                0 => (PaletteKind::SingleValue, 0),
                1..=4 => (PaletteKind::Linear, 4),
                5..=8 => (PaletteKind::HashMap, bits),
                _ => (PaletteKind::Global, self.global_bits()),
            },
            PaletteStrategy::SectionBiomes { .. } => match bits {
                0 => (PaletteKind::SingleValue, 0),
                1..=3 => (PaletteKind::Linear, bits),
                _ => (PaletteKind::Global, self.global_bits()),
            },
        }
    }
}

pub(crate) fn ceil_log2(n: u32) -> u8 {
    (u32::BITS - n.saturating_sub(1).leading_zeros()) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedContainer {
    palette: Palette,
    storage: BitStorage,
}

impl PalettedContainer {
    pub fn new(palette: Palette, storage: BitStorage) -> Self {
        Self { palette, storage }
    }

    /// Container holding `value` in every cell.
    pub fn single(strategy: PaletteStrategy, value: u32) -> Self {
        Self {
            palette: Palette::SingleValue(Some(value)),
            storage: BitStorage {
                bits: 0,
                size: strategy.size(),
                data: Vec::new(),
            },
        }
    }

    /// Builds an indirect container the way the client would after receiving `entries` and
    /// one palette index per cell. The width is the smallest one that can address every
    /// entry, which then picks the palette kind via `strategy`.
    pub fn indirect(strategy: PaletteStrategy, entries: Vec<u32>, indices: &[u32]) -> Result<Self> {
        if indices.len() != strategy.size() {
            return Err(NewChunksError::PaletteError(format!(
                "expected {} cells, got {}",
                strategy.size(),
                indices.len()
            )));
        }
        let needed = (usize::BITS - entries.len().saturating_sub(1).leading_zeros()).max(1) as u8;
        let (kind, bits) = strategy.configuration(needed);
        let palette = match kind {
            PaletteKind::Linear => Palette::Linear(entries),
            PaletteKind::HashMap => Palette::HashMap(entries),
            _ => {
                return Err(NewChunksError::PaletteError(format!(
                    "{} entries do not fit an indirect palette",
                    entries.len()
                )))
            }
        };
        Ok(Self {
            palette,
            storage: BitStorage::from_values(bits, indices)?,
        })
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn storage(&self) -> &BitStorage {
        &self.storage
    }

    /// Registry id in cell `index`.
    pub fn get(&self, index: usize) -> Result<u32> {
        let id = self.storage.get(index).ok_or_else(|| {
            NewChunksError::PaletteError(format!("cell {} out of range", index))
        })?;
        self.palette.value_for(id)
    }
}
