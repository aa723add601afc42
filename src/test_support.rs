//! Helpers shared by unit tests

use serde_json::Value;

use crate::core::document::MindMapDocument;
use crate::host::HostApp;

/// Host that keeps everything in fields and counts saves
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub data: Option<MindMapDocument>,
    pub config: Option<Value>,
    pub local_config: Option<Value>,
    pub language: Option<String>,
    pub data_saves: usize,
}

impl HostApp for RecordingHost {
    fn get_mind_map_data(&mut self) -> Option<MindMapDocument> {
        self.data.clone()
    }

    fn save_mind_map_data(&mut self, data: &MindMapDocument) {
        self.data = Some(data.clone());
        self.data_saves += 1;
    }

    fn get_mind_map_config(&mut self) -> Option<Value> {
        self.config.clone()
    }

    fn save_mind_map_config(&mut self, config: &Value) {
        self.config = Some(config.clone());
    }

    fn get_language(&mut self) -> Option<String> {
        self.language.clone()
    }

    fn save_language(&mut self, lang: &str) {
        self.language = Some(lang.to_string());
    }

    fn get_local_config(&mut self) -> Option<Value> {
        self.local_config.clone()
    }

    fn save_local_config(&mut self, config: &Value) {
        self.local_config = Some(config.clone());
    }
}
