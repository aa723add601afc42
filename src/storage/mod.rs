//! Persistent key-value storage

mod file;
mod memory;

use std::io;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Namespaced keys under which everything is persisted
pub mod keys {
    /// Single-document record written before sheets existed
    pub const LEGACY_DATA: &str = "SIMPLE_MIND_MAP_DATA";
    pub const SHEETS: &str = "SIMPLE_MIND_MAP_SHEETS";
    pub const CONFIG: &str = "SIMPLE_MIND_MAP_CONFIG";
    pub const LANG: &str = "SIMPLE_MIND_MAP_LANG";
    pub const LOCAL_CONFIG: &str = "SIMPLE_MIND_MAP_LOCAL_CONFIG";
}

/// Errors raised by a storage write
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key}: {required} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// String key-value storage in the manner of a browser's local storage
pub trait KeyValueStorage {
    /// Get the value stored under `key`
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing what was there
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}
