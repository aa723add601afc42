//! Sheets of an opened file, held in memory

use serde_json::Value;

use super::{BackendKind, PersistentBackend, SheetBackend, WriteOutcome};
use crate::core::document::{MindMapDocument, Sheet, SheetCollection};
use crate::core::file_system::FileHandle;
use crate::host::{EventSink, StoreEvent};
use crate::storage::StorageError;

/// Everything the session knows about the file being edited
#[derive(Debug, Default)]
pub struct LocalFileState {
    pub(crate) handling: bool,
    pub(crate) sheets: Option<SheetCollection>,
    pub(crate) handle: Option<FileHandle>,
}

impl LocalFileState {
    /// Replace the in-memory sheets. Empty or missing input clears them.
    pub(crate) fn seed(&mut self, collection: Option<SheetCollection>) {
        self.sheets = collection.and_then(SheetCollection::normalized);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Backend over [`LocalFileState`].
///
/// Settings are not part of the file and go to persistent storage.
pub struct LocalFileBackend<'a> {
    state: &'a mut LocalFileState,
    events: &'a dyn EventSink,
    settings: PersistentBackend<'a>,
}

impl<'a> LocalFileBackend<'a> {
    pub fn new(
        state: &'a mut LocalFileState,
        events: &'a dyn EventSink,
        settings: PersistentBackend<'a>,
    ) -> Self {
        Self {
            state,
            events,
            settings,
        }
    }
}

impl SheetBackend for LocalFileBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalFile
    }

    fn get_sheets(&mut self) -> SheetCollection {
        match &self.state.sheets {
            Some(collection) => collection.clone(),
            None => SheetCollection::single(Sheet::single(self.get_data())),
        }
    }

    fn set_sheets(&mut self, collection: SheetCollection) -> Result<WriteOutcome, StorageError> {
        match collection.normalized() {
            Some(collection) => {
                self.state.sheets = Some(collection);
                Ok(WriteOutcome::HeldInMemory)
            }
            None => Ok(WriteOutcome::Ignored),
        }
    }

    fn get_data(&mut self) -> MindMapDocument {
        self.state
            .sheets
            .as_ref()
            .and_then(SheetCollection::active)
            .map(|sheet| sheet.data.clone())
            .unwrap_or_else(MindMapDocument::example)
    }

    fn store_data(&mut self, partial: MindMapDocument) -> Result<WriteOutcome, StorageError> {
        let merged = self.get_data().merged(partial);
        match self.state.sheets.as_mut().and_then(SheetCollection::active_mut) {
            Some(active) => active.data = merged.clone(),
            None => {
                self.state.sheets = Some(SheetCollection::single(Sheet::single(merged.clone())))
            }
        }
        self.events.emit(StoreEvent::PrepareWriteLocalFile { merged });
        Ok(WriteOutcome::HeldInMemory)
    }

    fn get_config(&mut self) -> Option<Value> {
        self.settings.get_config()
    }

    fn store_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.settings.store_config(config)
    }

    fn get_lang(&mut self) -> String {
        self.settings.get_lang()
    }

    fn store_lang(&mut self, lang: &str) -> Result<WriteOutcome, StorageError> {
        self.settings.store_lang(lang)
    }

    fn get_local_config(&mut self) -> Option<Value> {
        self.settings.get_local_config()
    }

    fn store_local_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.settings.store_local_config(config)
    }
}
