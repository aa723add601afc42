//! The three places sheets and settings can live, behind one interface

mod host;
mod local_file;
mod persistent;

use std::fmt;

use serde_json::Value;

pub use host::HostBackend;
pub use local_file::{LocalFileBackend, LocalFileState};
pub use persistent::PersistentBackend;

use crate::core::document::{MindMapDocument, SheetCollection};
use crate::host::{EventSink, StoreEvent};
use crate::storage::{KeyValueStorage, StorageError};

/// Which backend answers reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// An embedding host owns all data
    Host,
    /// Sheets come from an opened file held in memory
    LocalFile,
    /// Sheets live in local key-value storage
    Persistent,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Host => "host",
            Self::LocalFile => "local file",
            Self::Persistent => "persistent",
        };
        f.write_str(name)
    }
}

/// What happened to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored in local key-value storage
    Persisted,
    /// Stored in the in-memory file sheets; the file itself is not written yet
    HeldInMemory,
    /// Handed to the embedding host
    ForwardedToHost,
    /// Not applicable to this backend, nothing changed
    Ignored,
    /// Dropped because storage is full; listeners were notified
    StorageExceeded,
}

/// Reads and writes of sheets, the active document and settings
pub trait SheetBackend {
    fn kind(&self) -> BackendKind;

    /// All sheets and the active index. Never empty.
    fn get_sheets(&mut self) -> SheetCollection;

    /// Replace all sheets
    fn set_sheets(&mut self, collection: SheetCollection) -> Result<WriteOutcome, StorageError>;

    /// A copy of the active sheet's document
    fn get_data(&mut self) -> MindMapDocument;

    /// Shallow-merge `partial` onto the active sheet's document and store the result
    fn store_data(&mut self, partial: MindMapDocument) -> Result<WriteOutcome, StorageError>;

    /// Editor configuration
    fn get_config(&mut self) -> Option<Value>;

    fn store_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError>;

    /// UI language code
    fn get_lang(&mut self) -> String;

    fn store_lang(&mut self, lang: &str) -> Result<WriteOutcome, StorageError>;

    /// Configuration that never leaves this machine
    fn get_local_config(&mut self) -> Option<Value>;

    fn store_local_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError>;
}

/// Write one key, turning a full store into a notification
fn persist(
    storage: &mut dyn KeyValueStorage,
    events: &dyn EventSink,
    key: &str,
    value: &str,
) -> Result<WriteOutcome, StorageError> {
    match storage.set_item(key, value) {
        Ok(()) => Ok(WriteOutcome::Persisted),
        Err(e) if e.is_quota_exceeded() => {
            tracing::warn!("Dropped write of {}: {}", key, e);
            events.emit(StoreEvent::StorageExceeded);
            Ok(WriteOutcome::StorageExceeded)
        }
        Err(e) => Err(e),
    }
}
