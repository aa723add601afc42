//! Session state and backend selection

use anyhow::{Context, Result};
use serde_json::Value;

use crate::backend::{
    BackendKind, HostBackend, LocalFileBackend, LocalFileState, PersistentBackend, SheetBackend,
    WriteOutcome,
};
use crate::core::document::{MindMapDocument, SheetCollection};
use crate::core::file_system::FileHandle;
use crate::host::{EventSink, HostApp, TracingSink};
use crate::storage::{KeyValueStorage, StorageError};

/// Language used when neither storage nor the host has one
pub const DEFAULT_LANGUAGE: &str = "zh";

struct HostState {
    app: Box<dyn HostApp>,
    /// Last document read from or written to the host
    cached: Option<MindMapDocument>,
}

/// All state the editor's persistence layer needs.
///
/// Each accessor resolves the backend afresh: the host when one has taken over,
/// else the opened local file, else persistent storage.
pub struct Session {
    storage: Box<dyn KeyValueStorage>,
    events: Box<dyn EventSink>,
    host: Option<HostState>,
    local_file: LocalFileState,
    default_language: String,
}

impl Session {
    /// Create a session over persistent storage, with no host and no file
    pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            events: Box::new(TracingSink),
            host: None,
            local_file: LocalFileState::default(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Send events to `events` instead of only logging them
    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_default_language(mut self, lang: impl Into<String>) -> Self {
        self.default_language = lang.into();
        self
    }

    /// Install or remove the takeover host
    pub fn set_host(&mut self, host: Option<Box<dyn HostApp>>) {
        self.host = host.map(|app| HostState { app, cached: None });
    }

    pub fn is_taken_over(&self) -> bool {
        self.host.is_some()
    }

    pub fn is_handling_local_file(&self) -> bool {
        self.local_file.handling
    }

    pub fn set_handling_local_file(&mut self, handling: bool) {
        self.local_file.handling = handling;
    }

    /// Switch to local-file mode with the given sheets
    pub fn open_local_file(&mut self, collection: SheetCollection, handle: Option<FileHandle>) {
        self.local_file.handling = true;
        self.local_file.seed(Some(collection));
        self.local_file.handle = handle;
        if let Some(handle) = &self.local_file.handle {
            tracing::info!("Editing local file: {}", handle.path().display());
        }
    }

    /// Leave local-file mode and forget the file
    pub fn close_local_file(&mut self) {
        self.local_file.reset();
    }

    pub fn local_file_handle(&self) -> Option<&FileHandle> {
        self.local_file.handle.as_ref()
    }

    /// Which backend the next call will use
    pub fn backend_kind(&self) -> BackendKind {
        if self.host.is_some() {
            BackendKind::Host
        } else if self.local_file.handling {
            BackendKind::LocalFile
        } else {
            BackendKind::Persistent
        }
    }

    /// Resolve the backend for one call
    pub fn backend(&mut self) -> Box<dyn SheetBackend + '_> {
        if let Some(host) = self.host.as_mut() {
            return Box::new(HostBackend::new(
                &mut *host.app,
                &mut host.cached,
                &self.default_language,
            ));
        }
        let persistent = PersistentBackend::new(
            &mut *self.storage,
            &*self.events,
            &self.default_language,
        );
        if self.local_file.handling {
            Box::new(LocalFileBackend::new(
                &mut self.local_file,
                &*self.events,
                persistent,
            ))
        } else {
            Box::new(persistent)
        }
    }

    pub fn get_sheets(&mut self) -> SheetCollection {
        self.backend().get_sheets()
    }

    pub fn set_sheets(&mut self, collection: SheetCollection) -> Result<WriteOutcome, StorageError> {
        self.backend().set_sheets(collection)
    }

    pub fn get_data(&mut self) -> MindMapDocument {
        self.backend().get_data()
    }

    pub fn store_data(&mut self, partial: MindMapDocument) -> Result<WriteOutcome, StorageError> {
        self.backend().store_data(partial)
    }

    pub fn get_config(&mut self) -> Option<Value> {
        self.backend().get_config()
    }

    pub fn store_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.backend().store_config(config)
    }

    pub fn get_lang(&mut self) -> String {
        self.backend().get_lang()
    }

    pub fn store_lang(&mut self, lang: &str) -> Result<WriteOutcome, StorageError> {
        self.backend().store_lang(lang)
    }

    pub fn get_local_config(&mut self) -> Option<Value> {
        self.backend().get_local_config()
    }

    pub fn store_local_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.backend().store_local_config(config)
    }

    /// The opened file's sheets, only while in local-file mode
    pub fn get_file_sheets(&self) -> Option<SheetCollection> {
        if !self.local_file.handling {
            return None;
        }
        self.local_file.sheets.clone()
    }

    /// Replace the opened file's sheets. `None` or an empty list clears them.
    pub fn set_file_sheets(&mut self, collection: Option<SheetCollection>) {
        self.local_file.seed(collection);
    }

    /// Write the opened file's sheets back to disk
    pub fn save_local_file(&self) -> Result<()> {
        let handle = self
            .local_file
            .handle
            .as_ref()
            .context("No local file is open")?;
        let collection = self
            .get_file_sheets()
            .context("Local file has no sheets to save")?;
        handle.write_sheets(&collection)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use super::*;
    use crate::core::document::Sheet;
    use crate::core::envelope;
    use crate::host::StoreEvent;
    use crate::storage::MemoryStorage;
    use crate::test_support::RecordingHost;

    fn doc(value: Value) -> MindMapDocument {
        MindMapDocument::from_value(value).unwrap()
    }

    fn session() -> (Session, UnboundedReceiver<StoreEvent>) {
        let (tx, rx) = unbounded_channel();
        (Session::new(MemoryStorage::new()).with_events(tx), rx)
    }

    fn file_sheets() -> SheetCollection {
        let sheet = |id: &str, text: &str| Sheet {
            id: id.to_string(),
            name: id.to_uppercase(),
            data: doc(json!({ "root": { "data": { "text": text } } })),
        };
        SheetCollection::with_active(vec![sheet("one", "1"), sheet("two", "2")], 1).unwrap()
    }

    #[test]
    fn test_backend_selection_order() {
        let (mut session, _rx) = session();
        assert_eq!(session.backend_kind(), BackendKind::Persistent);

        session.open_local_file(file_sheets(), None);
        assert_eq!(session.backend_kind(), BackendKind::LocalFile);
        assert_eq!(session.backend().kind(), BackendKind::LocalFile);

        session.set_host(Some(Box::new(RecordingHost::default())));
        assert_eq!(session.backend_kind(), BackendKind::Host);
        assert_eq!(session.backend().kind(), BackendKind::Host);

        session.set_host(None);
        session.close_local_file();
        assert_eq!(session.backend_kind(), BackendKind::Persistent);
    }

    #[test]
    fn test_persistent_round_trip_and_merge() {
        let (mut session, _rx) = session();
        let collection = file_sheets();
        session.set_sheets(collection.clone()).unwrap();
        assert_eq!(session.get_sheets(), collection);

        session
            .store_data(doc(json!({ "layout": "mindMap" })))
            .unwrap();
        let data = session.get_data();
        assert_eq!(data.get("layout"), Some(&json!("mindMap")));
        assert_eq!(data.root(), Some(&json!({ "data": { "text": "2" } })));
    }

    #[test]
    fn test_local_file_mode_does_not_touch_storage() {
        let (mut session, mut rx) = session();
        let stored = session.get_sheets();

        session.open_local_file(file_sheets(), None);
        assert_eq!(session.get_sheets(), file_sheets());
        session.store_data(doc(json!({ "view": 3 }))).unwrap();
        assert!(matches!(
            rx.try_recv().unwrap(),
            StoreEvent::PrepareWriteLocalFile { .. }
        ));
        assert_eq!(
            session.get_file_sheets().unwrap().sheets[1].data.get("view"),
            Some(&json!(3))
        );

        session.close_local_file();
        assert!(session.get_file_sheets().is_none());
        assert_eq!(session.get_sheets(), stored);
    }

    #[test]
    fn test_file_sheets_hidden_outside_local_file_mode() {
        let (mut session, _rx) = session();
        session.set_file_sheets(Some(file_sheets()));
        assert!(session.get_file_sheets().is_none());

        session.set_handling_local_file(true);
        assert_eq!(session.get_file_sheets(), Some(file_sheets()));

        session.set_file_sheets(None);
        assert!(session.get_file_sheets().is_none());
    }

    #[test]
    fn test_set_file_sheets_clamps_index() {
        let (mut session, _rx) = session();
        session.set_handling_local_file(true);
        let mut collection = file_sheets();
        collection.active_index = 7;
        session.set_file_sheets(Some(collection));
        assert_eq!(session.get_file_sheets().unwrap().active_index, 1);
    }

    #[test]
    fn test_host_takes_precedence() {
        let (mut session, _rx) = session();
        session.set_host(Some(Box::new(RecordingHost {
            data: Some(doc(json!({ "root": { "data": { "text": "host" } } }))),
            language: Some("en".to_string()),
            ..Default::default()
        })));

        assert_eq!(session.get_lang(), "en");
        session.store_data(doc(json!({ "layout": "x" }))).unwrap();
        let data = session.get_data();
        assert_eq!(data.get("layout"), Some(&json!("x")));
        assert_eq!(data.root(), Some(&json!({ "data": { "text": "host" } })));
        assert_eq!(
            session.set_sheets(file_sheets()).unwrap(),
            WriteOutcome::Ignored
        );

        session.set_host(None);
        assert_eq!(session.get_data(), MindMapDocument::example());
    }

    #[test]
    fn test_default_language_is_configurable() {
        let mut session = Session::new(MemoryStorage::new()).with_default_language("en");
        assert_eq!(session.get_lang(), "en");
    }

    #[test]
    fn test_save_local_file_writes_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::new(dir.path().join("map.smm"));
        let (mut session, _rx) = session();
        assert!(session.save_local_file().is_err());

        session.open_local_file(file_sheets(), Some(handle.clone()));
        session.store_data(doc(json!({ "view": 1 }))).unwrap();
        session.save_local_file().unwrap();

        let text = std::fs::read_to_string(handle.path()).unwrap();
        assert_eq!(envelope::parse(&text), session.get_file_sheets());
    }
}
