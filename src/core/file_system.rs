//! Local files opened for editing and atomic writes

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use super::document::SheetCollection;
use super::envelope;

/// Extension of mind-map files
pub const MIND_MAP_EXTENSION: &str = "smm";

/// A file the session is editing in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Check if this looks like a mind-map file
    pub fn is_mind_map(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext == MIND_MAP_EXTENSION)
            .unwrap_or(false)
    }

    /// Read the whole file as text
    pub async fn read_text(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read file: {}", self.path.display()))
    }

    /// Write the sheets back as a version 2 envelope
    pub fn write_sheets(&self, collection: &SheetCollection) -> Result<()> {
        let content = envelope::to_string(collection)?;
        write_atomic(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save file: {}", self.path.display()))?;
        tracing::info!(
            "Saved {} sheet(s) to: {}",
            collection.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Replace `path` with `bytes` without ever leaving a half-written file behind
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
