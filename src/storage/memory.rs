//! In-memory storage, also the cache behind [`super::FileStorage`]

use std::collections::BTreeMap;

use super::{KeyValueStorage, StorageError};

/// Storage that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of keys and values to `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub(crate) fn from_items(items: BTreeMap<String, String>, quota: Option<usize>) -> Self {
        Self { items, quota }
    }

    pub(crate) fn items(&self) -> &BTreeMap<String, String> {
        &self.items
    }

    /// Total bytes of all keys and values
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Insert and return the previous value, enforcing the quota
    pub(crate) fn insert(&mut self, key: &str, value: &str) -> Result<Option<String>, StorageError> {
        if let Some(quota) = self.quota {
            let current = self.items.get(key).map_or(0, |old| key.len() + old.len());
            let required = self.used_bytes() - current + key.len() + value.len();
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }
        Ok(self.items.insert(key.to_string(), value.to_string()))
    }

    /// Put back the value `insert` returned, undoing a write
    pub(crate) fn restore(&mut self, key: &str, previous: Option<String>) {
        match previous {
            Some(value) => {
                self.items.insert(key.to_string(), value);
            }
            None => {
                self.items.remove(key);
            }
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value).map(|_| ())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}
