//! Mind-map documents and the sheets that hold them

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Name given to a sheet whose stored name is missing or empty
pub const DEFAULT_SHEET_NAME: &str = "思维导图";
/// Name of the first sheet of a wrapped, migrated or placeholder collection
pub const FIRST_SHEET_NAME: &str = "思维导图1";
/// Id of the placeholder sheet built around a single document
pub const SINGLE_SHEET_ID: &str = "single";

/// A mind-map document.
///
/// The document belongs to the rendering engine. This crate only ever looks at
/// its top-level keys, and at most checks whether a `root` node is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MindMapDocument(Map<String, Value>);

impl MindMapDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The built-in example document shown for a fresh sheet
    pub fn example() -> Self {
        let value = json!({
            "root": {
                "data": { "text": "根节点" },
                "children": [
                    {
                        "data": { "text": "二级节点" },
                        "children": [
                            { "data": { "text": "分支主题" }, "children": [] },
                            { "data": { "text": "分支主题" }, "children": [] }
                        ]
                    }
                ]
            },
            "theme": { "template": "classic4", "config": {} },
            "layout": "logicalStructure",
            "config": {},
            "view": null
        });
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Wrap a JSON value, if it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The root node, if any
    pub fn root(&self) -> Option<&Value> {
        self.0.get("root")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every top-level key of `partial` replaces the same key here.
    ///
    /// Nested objects are not merged. A `root` in `partial` replaces the whole tree.
    pub fn merge(&mut self, partial: MindMapDocument) {
        for (key, value) in partial.0 {
            self.0.insert(key, value);
        }
    }

    /// Owned variant of [`MindMapDocument::merge`]
    pub fn merged(mut self, partial: MindMapDocument) -> Self {
        self.merge(partial);
        self
    }
}

impl From<Map<String, Value>> for MindMapDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Generate a sheet id that is unique within a session
pub fn generate_sheet_id() -> String {
    format!("sheet_{}", Uuid::new_v4().simple())
}

/// One named document within a multi-sheet file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub id: String,
    pub name: String,
    pub data: MindMapDocument,
}

impl Sheet {
    /// Create a sheet with a fresh id
    pub fn new(name: impl Into<String>, data: MindMapDocument) -> Self {
        Self {
            id: generate_sheet_id(),
            name: name.into(),
            data,
        }
    }

    /// The placeholder sheet used when only a single document is known
    pub fn single(data: MindMapDocument) -> Self {
        Self {
            id: SINGLE_SHEET_ID.to_string(),
            name: FIRST_SHEET_NAME.to_string(),
            data,
        }
    }

    /// Decode a stored sheet, filling in whatever is missing.
    ///
    /// A missing id is generated, a missing name defaults to [`DEFAULT_SHEET_NAME`],
    /// and missing or non-object data is replaced by the example document.
    pub fn from_value(value: &Value) -> Self {
        let id = Self::stored_id(value).unwrap_or_else(generate_sheet_id);
        let name = match value.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => DEFAULT_SHEET_NAME.to_string(),
        };
        let data = value
            .get("data")
            .cloned()
            .and_then(MindMapDocument::from_value)
            .unwrap_or_else(MindMapDocument::example);
        Self { id, name, data }
    }

    /// The id a stored sheet carries, if it has a usable one
    pub fn stored_id(value: &Value) -> Option<String> {
        match value.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }

    fn fill_defaults(&mut self) {
        if self.id.is_empty() {
            self.id = generate_sheet_id();
        }
        if self.name.is_empty() {
            self.name = DEFAULT_SHEET_NAME.to_string();
        }
    }
}

/// An ordered list of sheets plus the index of the active one.
///
/// Whenever `sheets` is non-empty, `active_index < sheets.len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetCollection {
    pub sheets: Vec<Sheet>,
    pub active_index: usize,
}

impl SheetCollection {
    /// A collection holding exactly one sheet, which is active
    pub fn single(sheet: Sheet) -> Self {
        Self {
            sheets: vec![sheet],
            active_index: 0,
        }
    }

    /// Build a collection from sheets and a requested index, clamping the index.
    ///
    /// Returns `None` for an empty sheet list.
    pub fn with_active(sheets: Vec<Sheet>, requested: usize) -> Option<Self> {
        if sheets.is_empty() {
            return None;
        }
        let active_index = clamp_index(requested, sheets.len());
        Some(Self {
            sheets,
            active_index,
        })
    }

    /// Decode a `{ sheets, activeIndex }` object leniently.
    ///
    /// Returns `None` unless `sheets` is a non-empty array. Each entry goes through
    /// [`Sheet::from_value`] and the active index is coerced and clamped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entries = value.get("sheets")?.as_array()?;
        let sheets: Vec<Sheet> = entries.iter().map(Sheet::from_value).collect();
        Self::with_active(sheets, coerce_index(value.get("activeIndex")))
    }

    /// Fill in missing ids and names and clamp the active index.
    ///
    /// Returns `None` if there are no sheets.
    pub fn normalized(mut self) -> Option<Self> {
        for sheet in &mut self.sheets {
            sheet.fill_defaults();
        }
        Self::with_active(self.sheets, self.active_index)
    }

    pub fn active(&self) -> Option<&Sheet> {
        self.sheets.get(self.active_index)
    }

    pub fn active_mut(&mut self) -> Option<&mut Sheet> {
        self.sheets.get_mut(self.active_index)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Read an active index the way loosely typed input supplies it.
///
/// Numbers are truncated, numeric strings are parsed, negatives become 0 and
/// anything else is 0.
pub fn coerce_index(value: Option<&Value>) -> usize {
    let index = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_leading_int(s).unwrap_or(0),
        _ => 0,
    };
    usize::try_from(index.max(0)).unwrap_or(usize::MAX)
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_start = usize::from(s.starts_with(['-', '+']));
    let end = s[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |pos| pos + digits_start);
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
