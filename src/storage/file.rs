//! Storage persisted as a single JSON file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{KeyValueStorage, MemoryStorage, StorageError};
use crate::core::file_system::write_atomic;

/// File name used inside the data directory
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Storage backed by one JSON object on disk, rewritten atomically on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    cache: MemoryStorage,
}

impl FileStorage {
    /// Open the storage file at `path`.
    ///
    /// A missing file starts empty. So does an unreadable one; it is logged and
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = if path.exists() {
            let content = std::fs::read(&path)?;
            match serde_json::from_slice::<BTreeMap<String, String>>(&content) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Opened storage {} with {} key(s)", path.display(), items.len());

        Ok(Self {
            path,
            cache: MemoryStorage::from_items(items, quota),
        })
    }

    /// Open `storage.json` inside `dir`
    pub fn open_in(dir: &Path, quota: Option<usize>) -> Result<Self, StorageError> {
        Self::open(dir.join(STORAGE_FILE_NAME), quota)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string(self.cache.items())?;
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.cache.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.cache.insert(key, value)?;
        if let Err(e) = self.flush() {
            self.cache.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let previous = self.cache.get_item(key);
        if previous.is_none() {
            return Ok(());
        }
        self.cache.remove_item(key)?;
        if let Err(e) = self.flush() {
            self.cache.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }
}
