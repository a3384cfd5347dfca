use crate::classifier::{Classification, PaletteClassifier};
use crate::config::{NewChunksSettings, MAX_ALPHA, MIN_ALPHA};
use crate::highlights::{HighlightCache, HighlightStore};
use crate::logger::{log, LogSeverity};
use crate::module::event::ChunkDataEvent;
use crate::module::Module;
use crate::render::{color_with_alpha, ChunkHighlightProvider};
use crate::world::{DimensionClass, DimensionId, PackedChunkPos, Registries, WorldId};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use LogSeverity::*;

pub const NEW_CHUNKS_CACHE: &str = "PaletteNewChunks";
pub const INVERSE_CACHE: &str = "PaletteNewChunksInverse";

/// Path a chunk data event took through [`PaletteNewChunks::on_chunk_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkDataOutcome {
    Disabled,
    SeenChunk,
    UnsupportedDimension,
    AlreadyClassified,
    Classified(Classification),
    Failed,
}

/// Highlights chunks the server generated for this client, judged by their palettes.
///
/// Every chunk is classified once per world and dimension: new chunks go to the positive
/// cache, everything else to the inverse cache. The renderer reads one of the two,
/// depending on the inverse toggle.
pub struct PaletteNewChunks {
    classifier: PaletteClassifier,
    new_chunks: HighlightCache,
    inverse: HighlightCache,
    enabled: AtomicBool,
    render_inverse: AtomicBool,
    color: AtomicU32,
    scope: RwLock<(WorldId, DimensionId)>,
    /// Held from the "already classified" check until the result is recorded.
    classify_lock: Mutex<()>,
}

impl PaletteNewChunks {
    pub fn new(
        settings: &NewChunksSettings,
        registries: Arc<Registries>,
        world: WorldId,
        dimension: DimensionId,
    ) -> Self {
        let store = HighlightStore::new(&settings.data_dir);
        let new_chunks = HighlightCache::new(NEW_CHUNKS_CACHE, store.clone());
        let inverse = HighlightCache::new(INVERSE_CACHE, store);
        new_chunks.set_disk_cache(settings.save_load_to_disk, false);
        inverse.set_disk_cache(settings.save_load_to_disk, false);
        Self {
            classifier: PaletteClassifier::new(registries),
            new_chunks,
            inverse,
            enabled: AtomicBool::new(false),
            render_inverse: AtomicBool::new(settings.render_inverse),
            color: AtomicU32::new(settings.highlight_color()),
            scope: RwLock::new((world, dimension)),
            classify_lock: Mutex::new(()),
        }
    }

    /// Classifies a received chunk and records the result, unless it was seen or
    /// classified before. Failures leave both caches untouched.
    pub fn on_chunk_data(&self, event: &ChunkDataEvent) -> ChunkDataOutcome {
        if !self.is_enabled() {
            return ChunkDataOutcome::Disabled;
        }
        // A chunk the client already held was generated before it arrived.
        if event.seen_chunk {
            return ChunkDataOutcome::SeenChunk;
        }
        let class = event.dimension.class();
        if class == DimensionClass::Other {
            return ChunkDataOutcome::UnsupportedDimension;
        }
        let _guard = self.classify_lock.lock();
        if self.scope.read().1 != event.dimension {
            self.on_dimension_change(event.dimension.clone());
        }

        let pos = event.pos();
        if self.new_chunks.is_highlighted(pos.x, pos.z, &event.dimension)
            || self.inverse.is_highlighted(pos.x, pos.z, &event.dimension)
        {
            return ChunkDataOutcome::AlreadyClassified;
        }

        match self.classifier.classify(class, &event.chunk) {
            Ok(classification) => {
                let cache = match classification {
                    Classification::New => &self.new_chunks,
                    Classification::Old => &self.inverse,
                };
                cache.add_highlight_in(pos.x, pos.z, &event.dimension);
                log(
                    format!(
                        "Chunk [{}, {}] in {} is {:?}",
                        pos.x, pos.z, event.dimension, classification
                    ),
                    Debug,
                );
                ChunkDataOutcome::Classified(classification)
            }
            Err(e) => {
                log(
                    format!("Could not classify chunk [{}, {}]: {}", pos.x, pos.z, e),
                    Debug,
                );
                ChunkDataOutcome::Failed
            }
        }
    }

    pub fn set_disk_cache(&self, disk: bool) {
        let enabled = self.is_enabled();
        self.new_chunks.set_disk_cache(disk, enabled);
        self.inverse.set_disk_cache(disk, enabled);
    }

    pub fn set_inverse(&self, render_inverse: bool) {
        self.render_inverse.store(render_inverse, Ordering::Release);
    }

    pub fn is_inverse(&self) -> bool {
        self.render_inverse.load(Ordering::Acquire)
    }

    /// Sets the overlay RGB, keeping the current opacity.
    pub fn set_rgb_color(&self, rgb: u32) {
        let alpha = (self.highlight_color() >> 24) as u8;
        self.color
            .store(color_with_alpha(rgb, alpha), Ordering::Release);
    }

    /// Sets the overlay opacity, clamped to the configurable range.
    pub fn set_alpha(&self, alpha: u32) {
        let alpha = alpha.clamp(MIN_ALPHA, MAX_ALPHA) as u8;
        self.color
            .store(color_with_alpha(self.highlight_color(), alpha), Ordering::Release);
    }

    pub fn highlight_color(&self) -> u32 {
        self.color.load(Ordering::Acquire)
    }

    fn render_cache(&self) -> &HighlightCache {
        if self.is_inverse() {
            &self.inverse
        } else {
            &self.new_chunks
        }
    }

    /// Whether the renderer should draw `(x, z)`.
    pub fn is_highlighted(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        self.render_cache().is_highlighted(x, z, dimension)
    }

    pub fn get_highlights_snapshot(
        &self,
        window_region_x: i32,
        window_region_z: i32,
        window_size: i32,
        dimension: &DimensionId,
    ) -> Vec<PackedChunkPos> {
        self.render_cache()
            .get_highlights_snapshot(window_region_x, window_region_z, window_size, dimension)
    }

    pub fn is_new_chunk(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        self.new_chunks.is_highlighted(x, z, dimension)
    }

    pub fn is_inverse_new_chunk(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        self.inverse.is_highlighted(x, z, dimension)
    }

    pub fn world(&self) -> WorldId {
        self.scope.read().0.clone()
    }

    pub fn dimension(&self) -> DimensionId {
        self.scope.read().1.clone()
    }

    pub fn on_world_change(&self, world: WorldId, dimension: DimensionId) {
        log(format!("Switching to world {} ({})", world, dimension), Info);
        *self.scope.write() = (world.clone(), dimension.clone());
        if self.is_enabled() {
            self.new_chunks.on_world_change(world.clone(), dimension.clone());
            self.inverse.on_world_change(world, dimension);
        }
    }

    pub fn on_dimension_change(&self, dimension: DimensionId) {
        log(format!("Switching to dimension {}", dimension), Debug);
        self.scope.write().1 = dimension.clone();
        self.new_chunks.set_dimension(dimension.clone());
        self.inverse.set_dimension(dimension);
    }

    /// Writes pending highlights of both caches. Returns the number of sets written.
    pub fn flush(&self) -> usize {
        self.new_chunks.flush() + self.inverse.flush()
    }
}

impl Module for PaletteNewChunks {
    fn name(&self) -> &str {
        "PaletteNewChunks"
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn on_enable(&self) {
        let (world, dimension) = self.scope.read().clone();
        self.new_chunks.on_enable(world.clone(), dimension.clone());
        self.inverse.on_enable(world, dimension);
        self.enabled.store(true, Ordering::Release);
    }

    fn on_disable(&self) {
        self.enabled.store(false, Ordering::Release);
        self.new_chunks.on_disable();
        self.inverse.on_disable();
    }
}

impl ChunkHighlightProvider for PaletteNewChunks {
    fn highlights_in_window(
        &self,
        window_region_x: i32,
        window_region_z: i32,
        window_size: i32,
        dimension: &DimensionId,
    ) -> Vec<PackedChunkPos> {
        self.get_highlights_snapshot(window_region_x, window_region_z, window_size, dimension)
    }

    fn is_highlighted(&self, x: i32, z: i32, dimension: &DimensionId) -> bool {
        PaletteNewChunks::is_highlighted(self, x, z, dimension)
    }

    fn highlight_color(&self) -> u32 {
        PaletteNewChunks::highlight_color(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::argb;
    use crate::testing::*;
    use crate::world::{ChunkColumn, ChunkPos};

    fn settings(test: &str, disk: bool) -> NewChunksSettings {
        NewChunksSettings {
            data_dir: scratch_dir(test),
            save_load_to_disk: disk,
            ..NewChunksSettings::default()
        }
    }

    fn enabled_module(test: &str) -> PaletteNewChunks {
        let module = PaletteNewChunks::new(
            &settings(test, false),
            Arc::new(Registries::default()),
            WorldId::new("localhost"),
            DimensionId::overworld(),
        );
        module.enable();
        module
    }

    fn event(dimension: DimensionId, seen: bool, chunk: ChunkColumn) -> ChunkDataEvent {
        ChunkDataEvent::new(dimension, seen, chunk)
    }

    #[test]
    fn test_new_and_old_chunks_land_in_separate_caches() {
        let module = enabled_module("module-classify");
        let overworld = DimensionId::overworld();

        let outcome = module.on_chunk_data(&event(overworld.clone(), false, new_column(1, 1)));
        assert_eq!(outcome, ChunkDataOutcome::Classified(Classification::New));
        let outcome = module.on_chunk_data(&event(overworld.clone(), false, old_column(2, 2)));
        assert_eq!(outcome, ChunkDataOutcome::Classified(Classification::Old));

        assert!(module.is_new_chunk(1, 1, &overworld));
        assert!(!module.is_inverse_new_chunk(1, 1, &overworld));
        assert!(module.is_inverse_new_chunk(2, 2, &overworld));
        assert!(!module.is_new_chunk(2, 2, &overworld));
    }

    #[test]
    fn test_seen_chunk_is_never_classified() {
        let module = enabled_module("module-seen");
        let overworld = DimensionId::overworld();
        let outcome = module.on_chunk_data(&event(overworld.clone(), true, new_column(1, 1)));
        assert_eq!(outcome, ChunkDataOutcome::SeenChunk);
        assert!(!module.is_new_chunk(1, 1, &overworld));
        assert!(!module.is_inverse_new_chunk(1, 1, &overworld));
    }

    #[test]
    fn test_classification_is_write_once() {
        let module = enabled_module("module-write-once");
        let overworld = DimensionId::overworld();
        module.on_chunk_data(&event(overworld.clone(), false, new_column(5, 5)));

        let outcome = module.on_chunk_data(&event(overworld.clone(), false, old_column(5, 5)));
        assert_eq!(outcome, ChunkDataOutcome::AlreadyClassified);
        assert!(module.is_new_chunk(5, 5, &overworld));
        assert!(!module.is_inverse_new_chunk(5, 5, &overworld));
    }

    #[test]
    fn test_failure_leaves_caches_untouched_and_can_be_retried() {
        let module = enabled_module("module-failure");
        let overworld = DimensionId::overworld();
        let outcome = module.on_chunk_data(&event(overworld.clone(), false, malformed_column(3, 3)));
        assert_eq!(outcome, ChunkDataOutcome::Failed);
        assert!(!module.is_new_chunk(3, 3, &overworld));
        assert!(!module.is_inverse_new_chunk(3, 3, &overworld));

        let outcome = module.on_chunk_data(&event(overworld, false, new_column(3, 3)));
        assert_eq!(outcome, ChunkDataOutcome::Classified(Classification::New));
    }

    #[test]
    fn test_unsupported_dimension_and_disabled_module() {
        let module = enabled_module("module-unsupported");
        let custom = DimensionId::new("example:mining");
        let outcome = module.on_chunk_data(&event(custom.clone(), false, new_column(0, 0)));
        assert_eq!(outcome, ChunkDataOutcome::UnsupportedDimension);
        assert!(!module.is_new_chunk(0, 0, &custom));

        module.disable();
        let outcome =
            module.on_chunk_data(&event(DimensionId::overworld(), false, new_column(0, 0)));
        assert_eq!(outcome, ChunkDataOutcome::Disabled);
    }

    #[test]
    fn test_events_follow_their_dimension() {
        let module = enabled_module("module-dimension");
        let end = DimensionId::end();
        let column = column(7, 7, vec![biome_section(vec![plains_id(), 16])]);
        let outcome = module.on_chunk_data(&event(end.clone(), false, column));
        assert_eq!(outcome, ChunkDataOutcome::Classified(Classification::New));
        assert_eq!(module.dimension(), end);
        assert!(module.is_new_chunk(7, 7, &end));
        assert!(!module.is_new_chunk(7, 7, &DimensionId::overworld()));
    }

    #[test]
    fn test_inverse_toggle_switches_render_cache() {
        let module = enabled_module("module-inverse");
        let overworld = DimensionId::overworld();
        module.on_chunk_data(&event(overworld.clone(), false, new_column(0, 0)));
        module.on_chunk_data(&event(overworld.clone(), false, old_column(1, 0)));

        assert!(module.is_highlighted(0, 0, &overworld));
        assert_eq!(
            module.get_highlights_snapshot(0, 0, 0, &overworld),
            vec![ChunkPos::new(0, 0).pack()]
        );

        module.set_inverse(true);
        assert!(!module.is_highlighted(0, 0, &overworld));
        assert!(module.is_highlighted(1, 0, &overworld));
        assert_eq!(
            module.highlights_in_window(0, 0, 0, &overworld),
            vec![ChunkPos::new(1, 0).pack()]
        );
    }

    #[test]
    fn test_color_updates() {
        let module = enabled_module("module-color");
        assert_eq!(module.highlight_color(), argb(255, 0, 0, 100));
        module.set_rgb_color(0x00_00FF00);
        assert_eq!(module.highlight_color(), argb(0, 255, 0, 100));
        module.set_alpha(3);
        assert_eq!(module.highlight_color(), argb(0, 255, 0, 10));
        module.set_alpha(200);
        assert_eq!(ChunkHighlightProvider::highlight_color(&module), argb(0, 255, 0, 200));
    }

    #[test]
    fn test_highlights_survive_restart_with_disk_cache() {
        let settings = settings("module-disk", true);
        let registries = Arc::new(Registries::default());
        let world = WorldId::new("play.example.net");
        let overworld = DimensionId::overworld();

        let module =
            PaletteNewChunks::new(&settings, registries.clone(), world.clone(), overworld.clone());
        module.enable();
        module.on_chunk_data(&event(overworld.clone(), false, new_column(10, -10)));
        module.on_chunk_data(&event(overworld.clone(), false, old_column(11, -10)));
        module.disable();

        let restarted = PaletteNewChunks::new(&settings, registries, world, overworld.clone());
        restarted.enable();
        assert!(restarted.is_new_chunk(10, -10, &overworld));
        assert!(restarted.is_inverse_new_chunk(11, -10, &overworld));
        let outcome = restarted.on_chunk_data(&event(overworld, false, new_column(11, -10)));
        assert_eq!(outcome, ChunkDataOutcome::AlreadyClassified);
    }

    #[test]
    fn test_world_change_starts_a_fresh_scope() {
        let module = enabled_module("module-world");
        let overworld = DimensionId::overworld();
        module.on_chunk_data(&event(overworld.clone(), false, new_column(0, 0)));
        module.on_world_change(WorldId::new("elsewhere"), overworld.clone());
        assert_eq!(module.world(), WorldId::new("elsewhere"));
        assert!(!module.is_new_chunk(0, 0, &overworld));
    }

    #[test]
    fn test_concurrent_events_and_reads() {
        let module = enabled_module("module-concurrent");
        let overworld = DimensionId::overworld();
        std::thread::scope(|scope| {
            for worker in 0..4 {
                let module = &module;
                let overworld = overworld.clone();
                scope.spawn(move || {
                    for i in 0..100 {
                        let column = if i % 2 == 0 {
                            new_column(worker, i)
                        } else {
                            old_column(worker, i)
                        };
                        module.on_chunk_data(&event(overworld.clone(), false, column));
                        assert!(module.is_new_chunk(worker, i, &overworld) == (i % 2 == 0));
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..100 {
                    for packed in module.get_highlights_snapshot(0, 0, 4, &overworld) {
                        let pos = ChunkPos::unpack(packed);
                        assert!(!module.is_inverse_new_chunk(pos.x, pos.z, &overworld));
                    }
                }
            });
        });
        assert_eq!(module.get_highlights_snapshot(0, 0, 4, &overworld).len(), 200);
    }

    #[test]
    fn test_conflicting_concurrent_events_classify_once() {
        let overworld = DimensionId::overworld();
        for _ in 0..50 {
            let module = enabled_module("module-conflict");
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    for i in 0..50 {
                        module.on_chunk_data(&event(overworld.clone(), false, new_column(i, 0)));
                    }
                });
                scope.spawn(|| {
                    for i in 0..50 {
                        module.on_chunk_data(&event(overworld.clone(), false, old_column(i, 0)));
                    }
                });
            });
            for i in 0..50 {
                let new = module.is_new_chunk(i, 0, &overworld);
                let old = module.is_inverse_new_chunk(i, 0, &overworld);
                assert!(new != old, "chunk [{}, 0] new={} old={}", i, new, old);
            }
        }
    }

    #[test]
    fn test_concurrent_dimensions_stay_partitioned() {
        let module = enabled_module("module-dimensions");
        let overworld = DimensionId::overworld();
        let nether = DimensionId::nether();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..2000 {
                    module.on_chunk_data(&event(overworld.clone(), false, new_column(i, 0)));
                }
            });
            scope.spawn(|| {
                for i in 0..2000 {
                    module.on_chunk_data(&event(nether.clone(), false, new_column(i, 1)));
                }
            });
        });
        for i in 0..2000 {
            assert!(module.is_new_chunk(i, 0, &overworld));
            assert!(module.is_new_chunk(i, 1, &nether));
            assert!(!module.is_new_chunk(i, 1, &overworld));
            assert!(!module.is_new_chunk(i, 0, &nether));
        }
    }
}
