//! Pass-through to an embedding host

use serde_json::Value;

use super::{BackendKind, SheetBackend, WriteOutcome};
use crate::core::document::{MindMapDocument, Sheet, SheetCollection};
use crate::host::HostApp;
use crate::storage::StorageError;

/// Backend forwarding every call to a [`HostApp`].
///
/// The host keeps a single document; it is presented as a one-sheet collection.
pub struct HostBackend<'a> {
    host: &'a mut dyn HostApp,
    cached: &'a mut Option<MindMapDocument>,
    default_language: &'a str,
}

impl<'a> HostBackend<'a> {
    pub fn new(
        host: &'a mut dyn HostApp,
        cached: &'a mut Option<MindMapDocument>,
        default_language: &'a str,
    ) -> Self {
        Self {
            host,
            cached,
            default_language,
        }
    }
}

impl SheetBackend for HostBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Host
    }

    fn get_sheets(&mut self) -> SheetCollection {
        SheetCollection::single(Sheet::single(self.get_data()))
    }

    fn set_sheets(&mut self, _collection: SheetCollection) -> Result<WriteOutcome, StorageError> {
        tracing::debug!("Host does not store sheet lists, ignoring");
        Ok(WriteOutcome::Ignored)
    }

    fn get_data(&mut self) -> MindMapDocument {
        let data = self.host.get_mind_map_data();
        self.cached.clone_from(&data);
        data.unwrap_or_else(MindMapDocument::example)
    }

    fn store_data(&mut self, partial: MindMapDocument) -> Result<WriteOutcome, StorageError> {
        let base = match self.cached.take() {
            Some(data) => data,
            None => self.host.get_mind_map_data().unwrap_or_default(),
        };
        let merged = base.merged(partial);
        self.host.save_mind_map_data(&merged);
        *self.cached = Some(merged);
        Ok(WriteOutcome::ForwardedToHost)
    }

    fn get_config(&mut self) -> Option<Value> {
        self.host.get_mind_map_config()
    }

    fn store_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.host.save_mind_map_config(config);
        Ok(WriteOutcome::ForwardedToHost)
    }

    fn get_lang(&mut self) -> String {
        self.host
            .get_language()
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| self.default_language.to_string())
    }

    fn store_lang(&mut self, lang: &str) -> Result<WriteOutcome, StorageError> {
        self.host.save_language(lang);
        Ok(WriteOutcome::ForwardedToHost)
    }

    fn get_local_config(&mut self) -> Option<Value> {
        self.host.get_local_config()
    }

    fn store_local_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.host.save_local_config(config);
        Ok(WriteOutcome::ForwardedToHost)
    }
}
