use crate::error::Result;
use crate::logger::LogSeverity;
use crate::render::argb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_ALPHA: u32 = 10;
pub const MAX_ALPHA: u32 = 255;

/// User settings for the new-chunks overlay. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NewChunksSettings {
    /// Root directory of persisted highlight sets.
    pub data_dir: PathBuf,
    pub save_load_to_disk: bool,
    /// Show chunks classified as old instead of new ones.
    pub render_inverse: bool,
    /// Overlay RGB.
    pub color: [u8; 3],
    /// Overlay opacity, clamped to `10..=255`.
    pub alpha: u32,
    /// Seconds between background flushes. `0` flushes only on disable and scope changes.
    pub flush_interval_secs: u64,
    pub log_level: LogSeverity,
    /// Registry manifest; vanilla registries when absent.
    pub registries: Option<PathBuf>,
}

impl Default for NewChunksSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("newchunks"),
            save_load_to_disk: true,
            render_inverse: false,
            color: [255, 0, 0],
            alpha: 100,
            flush_interval_secs: 60,
            log_level: LogSeverity::Info,
            registries: None,
        }
    }
}

impl NewChunksSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.clamped())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn clamped(mut self) -> Self {
        self.alpha = self.alpha.clamp(MIN_ALPHA, MAX_ALPHA);
        self
    }

    pub fn alpha(&self) -> u8 {
        self.alpha.clamp(MIN_ALPHA, MAX_ALPHA) as u8
    }

    /// Overlay color as ARGB.
    pub fn highlight_color(&self) -> u32 {
        let [r, g, b] = self.color;
        argb(r, g, b, self.alpha())
    }
}
