use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub const OVERWORLD: &str = "minecraft:overworld";
pub const NETHER: &str = "minecraft:the_nether";
pub const END: &str = "minecraft:the_end";

/// Identifier of a dimension, e.g. `minecraft:overworld`. Each dimension owns an
/// independent chunk coordinate space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DimensionId(Arc<str>);

/// Which classification rule applies to a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionClass {
    Overworld,
    Nether,
    End,
    Other,
}

impl DimensionId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn overworld() -> Self {
        Self::new(OVERWORLD)
    }

    pub fn nether() -> Self {
        Self::new(NETHER)
    }

    pub fn end() -> Self {
        Self::new(END)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn class(&self) -> DimensionClass {
        match self.as_str() {
            OVERWORLD => DimensionClass::Overworld,
            NETHER => DimensionClass::Nether,
            END => DimensionClass::End,
            _ => DimensionClass::Other,
        }
    }

    /// Directory name used for this dimension's persisted data. Vanilla dimensions use
    /// the `DIM0` / `DIM-1` / `DIM1` names map tools already write.
    pub fn storage_name(&self) -> String {
        match self.class() {
            DimensionClass::Overworld => "DIM0".to_owned(),
            DimensionClass::Nether => "DIM-1".to_owned(),
            DimensionClass::End => "DIM1".to_owned(),
            DimensionClass::Other => sanitize(self.as_str()),
        }
    }
}

impl From<String> for DimensionId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<DimensionId> for String {
    fn from(id: DimensionId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the world (server address or save name) highlights are recorded for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldId {
    name: String,
}

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable, filesystem-safe directory name derived from the world name.
    pub fn storage_name(&self) -> String {
        Uuid::new_v3(&Uuid::NAMESPACE_DNS, self.name.to_lowercase().as_bytes())
            .hyphenated()
            .to_string()
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect()
}
