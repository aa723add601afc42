//! Mindsheet - multi-sheet persistence for a mind-map editor
//!
//! Sheets, the active document and editor settings are read and written through a
//! [`Session`], which hands each call to one of three backends: an embedding host,
//! the sheets of an opened local file, or local key-value storage.

pub mod backend;
pub mod core;
pub mod host;
pub mod launch;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use crate::backend::{BackendKind, SheetBackend, WriteOutcome};
pub use crate::core::document::{MindMapDocument, Sheet, SheetCollection};
pub use crate::session::Session;
