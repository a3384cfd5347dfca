pub mod classifier;
pub mod config;
pub mod error;
pub mod highlights;
pub mod logger;
pub mod module;
pub mod protocol;
pub mod render;
pub mod service;
pub mod world;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use classifier::{Classification, PaletteClassifier};
pub use config::NewChunksSettings;
pub use error::{NewChunksError, Result};
pub use logger::{log, LogSeverity};
pub use module::{ChunkDataEvent, ChunkDataOutcome, Module, PaletteNewChunks};
pub use render::ChunkHighlightProvider;
