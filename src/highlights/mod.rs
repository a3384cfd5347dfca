//! Per-dimension chunk highlight sets and their on-disk form.

pub mod cache;
pub mod set;
pub mod store;

pub use cache::HighlightCache;
pub use set::RegionHighlights;
pub use store::HighlightStore;
