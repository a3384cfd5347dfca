use crate::error::NewChunksError;
use crate::highlights::set::RegionHighlights;
use crate::highlights::store::HighlightStore;
use crate::logger::{log, LogSeverity};
use crate::world::{ChunkPos, DimensionId, PackedChunkPos, WorldId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use LogSeverity::*;

/// Highlights of one dimension, behind their own lock so readers of one dimension never
/// wait on writers of another.
#[derive(Debug, Default)]
struct DimensionHighlights {
    set: RwLock<RegionHighlights>,
    /// Holds entries the store has not seen yet.
    dirty: AtomicBool,
    /// The store's copy has been merged in.
    loaded: AtomicBool,
}

#[derive(Debug)]
struct CacheState {
    enabled: bool,
    disk: bool,
    world: Option<WorldId>,
    dimension: DimensionId,
    dimensions: HashMap<DimensionId, Arc<DimensionHighlights>>,
}

/// Set of highlighted chunk coordinates, scoped by world and partitioned by dimension,
/// optionally mirrored to a [`HighlightStore`].
///
/// Reads never touch the disk. The store is only read or written on lifecycle and scope
/// transitions and on [`flush`](HighlightCache::flush).
#[derive(Debug)]
pub struct HighlightCache {
    name: String,
    store: HighlightStore,
    state: RwLock<CacheState>,
}

impl HighlightCache {
    pub fn new(name: impl Into<String>, store: HighlightStore) -> Self {
        Self {
            name: name.into(),
            store,
            state: RwLock::new(CacheState {
                enabled: false,
                disk: false,
                world: None,
                dimension: DimensionId::overworld(),
                dimensions: HashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    pub fn is_disk_cache(&self) -> bool {
        self.state.read().disk
    }

    pub fn active_dimension(&self) -> DimensionId {
        self.state.read().dimension.clone()
    }

    fn dimension(&self, dimension: &DimensionId) -> Option<Arc<DimensionHighlights>> {
        let state = self.state.read();
        if !state.enabled {
            return None;
        }
        state.dimensions.get(dimension).cloned()
    }

    pub fn is_highlighted(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        self.dimension(dimension)
            .is_some_and(|highlights| highlights.set.read().contains(ChunkPos::new(x, z)))
    }

    /// Records `(x, z)` in the active dimension. Returns `true` if it was not present yet.
    /// Does nothing while the cache is disabled.
    pub fn add_highlight(&self, x: i32, z: i32) -> bool {
        let dimension = self.active_dimension();
        self.add_highlight_in(x, z, &dimension)
    }

    /// Records `(x, z)` in `dimension` regardless of which dimension is active. A dimension
    /// seen for the first time in disk mode is hydrated before the insert.
    pub fn add_highlight_in(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        let existing = {
            let state = self.state.read();
            if !state.enabled {
                return false;
            }
            state.dimensions.get(dimension).cloned()
        };
        let highlights = match existing {
            Some(highlights) => highlights,
            None => {
                let (highlights, disk_world) = {
                    let mut state = self.state.write();
                    if !state.enabled {
                        return false;
                    }
                    let disk_world = if state.disk { state.world.clone() } else { None };
                    let highlights = state.dimensions.entry(dimension.clone()).or_default().clone();
                    (highlights, disk_world)
                };
                if let Some(world) = disk_world {
                    self.hydrate(&world, dimension, &highlights);
                }
                highlights
            }
        };
        let inserted = highlights.set.write().insert(ChunkPos::new(x, z));
        if inserted {
            highlights.dirty.store(true, Ordering::Release);
        }
        inserted
    }

    /// Every highlight of `dimension` whose region lies within `window_size` regions of
    /// `(window_region_x, window_region_z)` on both axes. Unordered.
    pub fn get_highlights_snapshot(
        &self,
        window_region_x: i32,
        window_region_z: i32,
        window_size: i32,
        dimension: &DimensionId,
    ) -> Vec<PackedChunkPos> {
        self.dimension(dimension)
            .map(|highlights| {
                highlights
                    .set
                    .read()
                    .window(window_region_x, window_region_z, window_size)
            })
            .unwrap_or_default()
    }

    /// Number of highlights held for `dimension`.
    pub fn len(&self, dimension: &DimensionId) -> usize {
        self.dimension(dimension)
            .map_or(0, |highlights| highlights.set.read().len())
    }

    /// Starts recording for `world`, hydrating the active dimension from the store when disk
    /// mode is on.
    pub fn on_enable(&self, world: WorldId, dimension: DimensionId) {
        {
            let mut state = self.state.write();
            state.enabled = true;
            state.world = Some(world);
            state.dimension = dimension;
            state.dimensions.clear();
        }
        log(format!("{} enabled", self.name), Info);
        self.hydrate_active_dimension();
    }

    /// Stops recording, persisting pending highlights first when disk mode is on, and
    /// releases the in-memory sets.
    pub fn on_disable(&self) {
        let (world, dimensions, disk) = {
            let mut state = self.state.write();
            if !state.enabled {
                return;
            }
            state.enabled = false;
            let dimensions = std::mem::take(&mut state.dimensions);
            (state.world.clone(), dimensions, state.disk)
        };
        if disk {
            if let Some(world) = world {
                self.persist(&world, dimensions.iter(), true);
            }
        }
        log(format!("{} disabled", self.name), Info);
    }

    /// Switches disk mode. Turning it on while the module is enabled merges the stored sets
    /// into memory; turning it off writes pending highlights and keeps memory as is.
    pub fn set_disk_cache(&self, disk: bool, module_enabled: bool) {
        let was_disk = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.disk, disk)
        };
        if disk == was_disk {
            return;
        }
        if disk {
            if module_enabled && self.is_enabled() {
                self.hydrate_all();
            }
        } else {
            self.flush_with(true);
        }
    }

    /// Moves the cache to a new world: pending highlights of the old world are written, all
    /// sets are dropped, then the new scope is hydrated.
    pub fn on_world_change(&self, world: WorldId, dimension: DimensionId) {
        self.flush();
        {
            let mut state = self.state.write();
            state.world = Some(world);
            state.dimension = dimension;
            state.dimensions.clear();
        }
        self.hydrate_active_dimension();
    }

    /// Makes `dimension` the target of [`add_highlight`](HighlightCache::add_highlight),
    /// loading its stored set the first time it becomes active.
    pub fn set_dimension(&self, dimension: DimensionId) {
        {
            let state = self.state.read();
            if state.dimension == dimension {
                return;
            }
        }
        self.state.write().dimension = dimension;
        self.hydrate_active_dimension();
    }

    /// Writes every dimension with unsaved highlights. Returns the number of sets written.
    pub fn flush(&self) -> usize {
        self.flush_with(false)
    }

    fn flush_with(&self, force: bool) -> usize {
        let (world, dimensions, disk) = {
            let state = self.state.read();
            if !state.enabled || !(state.disk || force) {
                return 0;
            }
            match &state.world {
                Some(world) => (world.clone(), state.dimensions.clone(), state.disk),
                None => return 0,
            }
        };
        self.persist(&world, dimensions.iter(), disk)
    }

    /// Writes dirty sets. With `require_loaded`, a set whose stored copy could not be read
    /// yet gets one more read attempt and is skipped if that fails too, so the stored file is
    /// never replaced by a partial set.
    fn persist<'a>(
        &self,
        world: &WorldId,
        dimensions: impl Iterator<Item = (&'a DimensionId, &'a Arc<DimensionHighlights>)>,
        require_loaded: bool,
    ) -> usize {
        let mut written = 0;
        for (dimension, highlights) in dimensions {
            if require_loaded && !highlights.loaded.load(Ordering::Acquire) {
                self.hydrate(world, dimension, highlights);
                if !highlights.loaded.load(Ordering::Acquire) {
                    log(
                        format!(
                            "{} keeps highlights for {} unsaved until its stored set can be read",
                            self.name, dimension
                        ),
                        Warning,
                    );
                    continue;
                }
            }
            if !highlights.dirty.swap(false, Ordering::AcqRel) {
                continue;
            }
            let packed = highlights.set.read().to_vec();
            match self.store.save(world, dimension, &self.name, &packed) {
                Ok(()) => {
                    written += 1;
                    log(
                        format!("{} saved {} highlights for {}", self.name, packed.len(), dimension),
                        Debug,
                    );
                }
                Err(e) => {
                    highlights.dirty.store(true, Ordering::Release);
                    log(
                        format!("{} failed to save highlights for {}: {}", self.name, dimension, e),
                        Warning,
                    );
                }
            }
        }
        written
    }

    fn hydrate_active_dimension(&self) {
        let target = {
            let mut state = self.state.write();
            if !state.enabled || !state.disk {
                return;
            }
            let world = match &state.world {
                Some(world) => world.clone(),
                None => return,
            };
            let dimension = state.dimension.clone();
            let highlights = state.dimensions.entry(dimension.clone()).or_default().clone();
            (world, dimension, highlights)
        };
        let (world, dimension, highlights) = target;
        self.hydrate(&world, &dimension, &highlights);
    }

    fn hydrate_all(&self) {
        let (world, dimensions) = {
            let mut state = self.state.write();
            let world = match &state.world {
                Some(world) => world.clone(),
                None => return,
            };
            let active = state.dimension.clone();
            state.dimensions.entry(active).or_default();
            (world, state.dimensions.clone())
        };
        for (dimension, highlights) in &dimensions {
            highlights.loaded.store(false, Ordering::Release);
            self.hydrate(&world, dimension, highlights);
        }
    }

    fn hydrate(&self, world: &WorldId, dimension: &DimensionId, highlights: &DimensionHighlights) {
        if highlights.loaded.swap(true, Ordering::AcqRel) {
            return;
        }
        let stored = match self.store.load(world, dimension, &self.name) {
            Ok(stored) => stored,
            Err(NewChunksError::IoError(e)) => {
                // Retried on the next transition or flush.
                highlights.loaded.store(false, Ordering::Release);
                log(
                    format!("{} could not read highlights for {}: {}", self.name, dimension, e),
                    Warning,
                );
                return;
            }
            Err(e) => {
                log(
                    format!("{} discards unreadable highlights for {}: {}", self.name, dimension, e),
                    Warning,
                );
                Vec::new()
            }
        };
        let mut set = highlights.set.write();
        let had_unsaved = !set.is_empty();
        let added = set.extend(stored);
        if had_unsaved {
            highlights.dirty.store(true, Ordering::Release);
        }
        log(
            format!("{} loaded {} highlights for {}", self.name, added, dimension),
            Debug,
        );
    }
}
