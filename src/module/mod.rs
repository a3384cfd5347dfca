//! Toggleable features and the events they react to.

pub mod event;
pub mod palette_new_chunks;

pub use event::ChunkDataEvent;
pub use palette_new_chunks::{ChunkDataOutcome, PaletteNewChunks};

/// A feature that can be switched on and off at runtime.
pub trait Module {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Called on every transition to enabled.
    fn on_enable(&self);

    /// Called on every transition to disabled.
    fn on_disable(&self);

    fn enable(&self) {
        if !self.is_enabled() {
            self.on_enable();
        }
    }

    fn disable(&self) {
        if self.is_enabled() {
            self.on_disable();
        }
    }

    fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.enable()
        } else {
            self.disable()
        }
    }
}
