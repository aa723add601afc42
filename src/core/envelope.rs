//! The on-disk envelope wrapping one or more sheets

use serde::Serialize;
use serde_json::Value;

use super::document::{
    coerce_index, MindMapDocument, Sheet, SheetCollection, FIRST_SHEET_NAME,
};

/// Version written into every envelope this crate produces
pub const SMM_VERSION: u64 = 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    smm_version: u64,
    sheets: &'a [Sheet],
    active_index: usize,
}

/// Parse file content into a sheet collection.
///
/// Returns `None` when the text is not JSON or not a JSON object. A version 2
/// envelope with at least one sheet is normalized sheet by sheet. Any other object
/// is a bare legacy document and becomes the only sheet of the result.
pub fn parse(content: &str) -> Option<SheetCollection> {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("File content is not valid JSON: {}", e);
            return None;
        }
    };
    if !value.is_object() {
        tracing::debug!("File content is not a JSON object");
        return None;
    }

    if is_versioned(&value) {
        let entries = value.get("sheets").and_then(Value::as_array)?;
        let sheets = entries.iter().map(Sheet::from_value).collect();
        return SheetCollection::with_active(sheets, coerce_index(value.get("activeIndex")));
    }

    let document = MindMapDocument::from_value(value)?;
    let data = if document.root().is_some_and(|root| !root.is_null()) {
        document
    } else {
        let mut wrapped = MindMapDocument::example();
        wrapped.insert("root", document.into_value());
        wrapped
    };
    Some(SheetCollection::single(Sheet::new(FIRST_SHEET_NAME, data)))
}

fn is_versioned(value: &Value) -> bool {
    value.get("smmVersion").and_then(Value::as_f64) == Some(SMM_VERSION as f64)
        && value
            .get("sheets")
            .and_then(Value::as_array)
            .is_some_and(|sheets| !sheets.is_empty())
}

/// Serialize a collection as a version 2 envelope
pub fn to_string(collection: &SheetCollection) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope {
        smm_version: SMM_VERSION,
        sheets: &collection.sheets,
        active_index: collection.active_index,
    })
}
