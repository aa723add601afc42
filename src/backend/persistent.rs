//! Sheets and settings in local key-value storage

use serde_json::Value;

use super::{persist, BackendKind, SheetBackend, WriteOutcome};
use crate::core::document::{MindMapDocument, Sheet, SheetCollection, FIRST_SHEET_NAME};
use crate::host::EventSink;
use crate::storage::{keys, KeyValueStorage, StorageError};

/// Backend over a [`KeyValueStorage`]
pub struct PersistentBackend<'a> {
    storage: &'a mut dyn KeyValueStorage,
    events: &'a dyn EventSink,
    default_language: &'a str,
}

impl<'a> PersistentBackend<'a> {
    pub fn new(
        storage: &'a mut dyn KeyValueStorage,
        events: &'a dyn EventSink,
        default_language: &'a str,
    ) -> Self {
        Self {
            storage,
            events,
            default_language,
        }
    }

    /// Decode the stored collection. The flag is set when ids had to be generated.
    fn read_sheets(&self) -> Option<(SheetCollection, bool)> {
        let raw = self.storage.get_item(keys::SHEETS)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                let Some(collection) = SheetCollection::from_value(&value) else {
                    tracing::warn!("Stored sheets are empty or malformed");
                    return None;
                };
                let ids_filled = value
                    .get("sheets")
                    .and_then(Value::as_array)
                    .is_some_and(|sheets| sheets.iter().any(|s| Sheet::stored_id(s).is_none()));
                Some((collection, ids_filled))
            }
            Err(e) => {
                tracing::warn!("Failed to parse stored sheets: {}", e);
                None
            }
        }
    }

    /// Build the first sheet from the pre-sheet single document, or the example
    fn migrate_legacy(&mut self) -> SheetCollection {
        let mut data = MindMapDocument::example();
        if let Some(raw) = self.storage.get_item(keys::LEGACY_DATA) {
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    if let Some(legacy) = MindMapDocument::from_value(value) {
                        data.merge(legacy);
                    }
                }
                Err(e) => tracing::warn!("Ignoring unreadable legacy document: {}", e),
            }
            tracing::info!("Migrating legacy document into sheet storage");
        }

        let collection = SheetCollection::single(Sheet::new(FIRST_SHEET_NAME, data));
        if let Err(e) = self.write_sheets(&collection) {
            tracing::error!("Failed to store migrated sheets: {}", e);
        }
        collection
    }

    fn write_sheets(&mut self, collection: &SheetCollection) -> Result<WriteOutcome, StorageError> {
        let raw = serde_json::to_string(collection)?;
        persist(self.storage, self.events, keys::SHEETS, &raw)
    }

    fn read_json(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to parse stored {}: {}", key, e);
                None
            }
        }
    }

    fn write_json(&mut self, key: &str, value: &Value) -> Result<WriteOutcome, StorageError> {
        let raw = serde_json::to_string(value)?;
        persist(self.storage, self.events, key, &raw)
    }
}

impl SheetBackend for PersistentBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Persistent
    }

    fn get_sheets(&mut self) -> SheetCollection {
        match self.read_sheets() {
            Some((collection, false)) => collection,
            Some((collection, true)) => {
                // Generated ids must survive the next read.
                if let Err(e) = self.write_sheets(&collection) {
                    tracing::error!("Failed to store sheet ids: {}", e);
                }
                collection
            }
            None => self.migrate_legacy(),
        }
    }

    fn set_sheets(&mut self, collection: SheetCollection) -> Result<WriteOutcome, StorageError> {
        let Some(collection) = collection.normalized() else {
            tracing::debug!("Refusing to store an empty sheet list");
            return Ok(WriteOutcome::Ignored);
        };
        self.write_sheets(&collection)
    }

    fn get_data(&mut self) -> MindMapDocument {
        self.get_sheets()
            .active()
            .map(|sheet| sheet.data.clone())
            .unwrap_or_else(MindMapDocument::example)
    }

    fn store_data(&mut self, partial: MindMapDocument) -> Result<WriteOutcome, StorageError> {
        let mut collection = self.get_sheets();
        let Some(active) = collection.active_mut() else {
            return Ok(WriteOutcome::Ignored);
        };
        active.data.merge(partial);
        self.set_sheets(collection)
    }

    fn get_config(&mut self) -> Option<Value> {
        self.read_json(keys::CONFIG)
    }

    fn store_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.write_json(keys::CONFIG, config)
    }

    fn get_lang(&mut self) -> String {
        match self.storage.get_item(keys::LANG) {
            Some(lang) if !lang.is_empty() => lang,
            _ => {
                let lang = self.default_language.to_string();
                if let Err(e) = self.store_lang(&lang) {
                    tracing::warn!("Failed to store default language: {}", e);
                }
                lang
            }
        }
    }

    fn store_lang(&mut self, lang: &str) -> Result<WriteOutcome, StorageError> {
        persist(self.storage, self.events, keys::LANG, lang)
    }

    fn get_local_config(&mut self) -> Option<Value> {
        self.read_json(keys::LOCAL_CONFIG)
    }

    fn store_local_config(&mut self, config: &Value) -> Result<WriteOutcome, StorageError> {
        self.write_json(keys::LOCAL_CONFIG, config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::host::{StoreEvent, TracingSink};
    use crate::storage::MemoryStorage;

    fn doc(value: Value) -> MindMapDocument {
        MindMapDocument::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_storage_yields_example_sheet() {
        let mut storage = MemoryStorage::new();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let collection = backend.get_sheets();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.active_index, 0);
        assert_eq!(collection.sheets[0].name, FIRST_SHEET_NAME);
        assert_eq!(collection.sheets[0].data, MindMapDocument::example());
        assert!(storage.get_item(keys::SHEETS).is_some());
    }

    #[test]
    fn test_legacy_migration_merges_and_persists_once() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(keys::LEGACY_DATA, r#"{"root":{"data":{"text":"old"}},"layout":"mindMap"}"#)
            .unwrap();

        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let migrated = backend.get_sheets();
        let expected = MindMapDocument::example().merged(doc(json!({
            "root": { "data": { "text": "old" } },
            "layout": "mindMap"
        })));
        assert_eq!(migrated.len(), 1);
        assert_eq!(migrated.sheets[0].data, expected);

        // A second read must come from the stored collection, keeping the same id.
        let again = backend.get_sheets();
        assert_eq!(again, migrated);
    }

    #[test]
    fn test_corrupt_sheets_fall_back_to_migration() {
        let mut storage = MemoryStorage::new();
        storage.set_item(keys::SHEETS, "{ broken").unwrap();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let collection = backend.get_sheets();
        assert_eq!(collection.sheets[0].data, MindMapDocument::example());
    }

    #[test]
    fn test_generated_ids_are_stable_across_reads() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                keys::SHEETS,
                r#"{"sheets":[{"name":"A","data":{"root":{}}},{"id":"b","name":"B"}],"activeIndex":0}"#,
            )
            .unwrap();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");

        let first = backend.get_sheets();
        let second = backend.get_sheets();
        assert!(first.sheets[0].id.starts_with("sheet_"));
        assert_eq!(first.sheets[1].id, "b");
        assert_eq!(first, second);

        let stored: Value = serde_json::from_str(&storage.get_item(keys::SHEETS).unwrap()).unwrap();
        assert_eq!(stored["sheets"][0]["id"], json!(first.sheets[0].id));
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let mut storage = MemoryStorage::new();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let collection = SheetCollection::with_active(
            vec![
                Sheet::new("A", doc(json!({ "root": { "data": { "text": "a" } } }))),
                Sheet::new("B", doc(json!({ "root": { "data": { "text": "b" } } }))),
            ],
            1,
        )
        .unwrap();

        assert_eq!(
            backend.set_sheets(collection.clone()).unwrap(),
            WriteOutcome::Persisted
        );
        assert_eq!(backend.get_sheets(), collection);
    }

    #[test]
    fn test_store_data_merges_into_active_sheet() {
        let mut storage = MemoryStorage::new();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let collection = SheetCollection::with_active(
            vec![
                Sheet::new("A", doc(json!({ "root": {}, "layout": "a" }))),
                Sheet::new("B", doc(json!({ "root": {}, "layout": "b" }))),
            ],
            1,
        )
        .unwrap();
        backend.set_sheets(collection).unwrap();

        backend
            .store_data(doc(json!({ "view": { "scale": 1.5 } })))
            .unwrap();
        let data = backend.get_data();
        assert_eq!(data.get("view"), Some(&json!({ "scale": 1.5 })));
        assert_eq!(data.get("layout"), Some(&json!("b")));

        let sheets = backend.get_sheets();
        assert_eq!(sheets.sheets[0].data.get("view"), None);
    }

    #[test]
    fn test_quota_exceeded_keeps_previous_sheets() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut storage = MemoryStorage::with_quota(2048);
        let mut backend = PersistentBackend::new(&mut storage, &tx, "zh");
        let before = backend.get_sheets();

        let huge = doc(json!({ "root": { "data": { "text": "x".repeat(4096) } } }));
        let outcome = backend.store_data(huge).unwrap();
        assert_eq!(outcome, WriteOutcome::StorageExceeded);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::StorageExceeded);
        assert!(rx.try_recv().is_err());
        assert_eq!(backend.get_sheets(), before);
    }

    #[test]
    fn test_empty_collection_is_not_stored() {
        let mut storage = MemoryStorage::new();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        let empty = SheetCollection {
            sheets: Vec::new(),
            active_index: 0,
        };
        assert_eq!(backend.set_sheets(empty).unwrap(), WriteOutcome::Ignored);
        assert!(storage.get_item(keys::SHEETS).is_none());
    }

    #[test]
    fn test_language_defaults_and_persists() {
        let mut storage = MemoryStorage::new();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        assert_eq!(backend.get_lang(), "zh");
        backend.store_lang("en").unwrap();
        assert_eq!(backend.get_lang(), "en");
        assert_eq!(storage.get_item(keys::LANG).as_deref(), Some("en"));
    }

    #[test]
    fn test_configs_round_trip_and_tolerate_garbage() {
        let mut storage = MemoryStorage::new();
        storage.set_item(keys::LOCAL_CONFIG, "not json").unwrap();
        let mut backend = PersistentBackend::new(&mut storage, &TracingSink, "zh");
        assert_eq!(backend.get_config(), None);
        assert_eq!(backend.get_local_config(), None);

        backend.store_config(&json!({ "readonly": true })).unwrap();
        backend
            .store_local_config(&json!({ "isZenMode": false }))
            .unwrap();
        assert_eq!(backend.get_config(), Some(json!({ "readonly": true })));
        assert_eq!(backend.get_local_config(), Some(json!({ "isZenMode": false })));
    }
}
