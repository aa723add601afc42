//! Embedding host callbacks and the events the session emits

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::document::MindMapDocument;

/// Persistence callbacks supplied by a host that takes over the editor.
///
/// While a host is installed it owns the document, the editor config, the
/// language and the local config. Nothing is written to local storage.
pub trait HostApp {
    /// The document the host currently holds
    fn get_mind_map_data(&mut self) -> Option<MindMapDocument>;

    /// Replace the host's document
    fn save_mind_map_data(&mut self, data: &MindMapDocument);

    fn get_mind_map_config(&mut self) -> Option<Value>;

    fn save_mind_map_config(&mut self, config: &Value);

    /// The host's UI language code
    fn get_language(&mut self) -> Option<String>;

    fn save_language(&mut self, lang: &str);

    fn get_local_config(&mut self) -> Option<Value>;

    fn save_local_config(&mut self, config: &Value);
}

/// Notifications for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A write was dropped because persistent storage is full
    StorageExceeded,
    /// The active document changed in local-file mode; the file should be rewritten
    PrepareWriteLocalFile { merged: MindMapDocument },
}

/// Receiver of [`StoreEvent`]s
pub trait EventSink {
    fn emit(&self, event: StoreEvent);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: StoreEvent) {
        match event {
            StoreEvent::StorageExceeded => tracing::warn!("Local storage is full"),
            StoreEvent::PrepareWriteLocalFile { merged } => {
                tracing::debug!("Local file needs writing ({} top-level keys)", merged.len())
            }
        }
    }
}

impl EventSink for UnboundedSender<StoreEvent> {
    fn emit(&self, event: StoreEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }
}
