use crate::error::{NewChunksError, Result};
use crate::protocol::nbt::{NBTFile, Tag};
use crate::world::{DimensionId, PackedChunkPos, WorldId};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const HIGHLIGHTS_KEY: &str = "highlights";

/// On-disk home of highlight sets: `<root>/<world>/<dimension>/<cache>.dat`, each file a
/// gzip NBT compound holding one long array of packed chunk coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightStore {
    root: PathBuf,
}

impl HighlightStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, world: &WorldId, dimension: &DimensionId, cache: &str) -> PathBuf {
        self.root
            .join(world.storage_name())
            .join(dimension.storage_name())
            .join(format!("{}.dat", cache))
    }

    /// Reads a persisted set. A missing file is an empty set, an unreadable file an
    /// `IoError` and undecodable contents a `PersistenceError`.
    pub fn load(
        &self,
        world: &WorldId,
        dimension: &DimensionId,
        cache: &str,
    ) -> Result<Vec<PackedChunkPos>> {
        let path = self.path(world, dimension, cache);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let nbt = NBTFile::read_gzip(&mut bytes.as_slice()).map_err(|e| {
            NewChunksError::PersistenceError(format!("{}: {}", path.display(), e))
        })?;
        nbt.root
            .as_compound()
            .and_then(|root| root.get(HIGHLIGHTS_KEY))
            .and_then(Tag::as_long_array)
            .map(<[i64]>::to_vec)
            .ok_or_else(|| {
                NewChunksError::PersistenceError(format!(
                    "{}: no {} long array",
                    path.display(),
                    HIGHLIGHTS_KEY
                ))
            })
    }

    /// Replaces the persisted set. The file is written next to its destination and renamed
    /// over it, so readers never observe a partial file.
    pub fn save(
        &self,
        world: &WorldId,
        dimension: &DimensionId,
        cache: &str,
        highlights: &[PackedChunkPos],
    ) -> Result<()> {
        let path = self.path(world, dimension, cache);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut root = HashMap::new();
        root.insert(HIGHLIGHTS_KEY.to_owned(), Tag::LongArray(highlights.to_vec()));
        let nbt = NBTFile::new(String::new(), Tag::Compound(root));

        let tmp_path = path.with_extension("dat.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            nbt.write_gzip(&mut writer)?;
            writer.flush()?;
            let file = writer
                .into_inner()
                .map_err(|e| NewChunksError::IoError(e.into_error()))?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}
