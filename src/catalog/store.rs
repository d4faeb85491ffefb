//! On-disk cache of the confirmed platform list.
//!
//! One `code;description` pair per line. A missing or blank file means
//! "nothing cached" and sends the run to the live catalog page.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PlatformCatalog, PlatformEntry};
use crate::error::ConfigurationError;

/// Default cache filename, relative to the working directory.
pub const DEFAULT_CATALOG_FILE: &str = ".patchget.cfg";

/// File-backed platform cache.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached catalog; `Ok(None)` when the file is absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedCatalogLine`] for a line without
    /// `;`, or [`ConfigurationError::CatalogIo`] when the file cannot be read.
    pub fn load(&self) -> Result<Option<PlatformCatalog>, ConfigurationError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached platform catalog");
                return Ok(None);
            }
            Err(error) => return Err(ConfigurationError::catalog_io(&self.path, error)),
        };

        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((code, description)) = line.split_once(';') else {
                return Err(ConfigurationError::MalformedCatalogLine {
                    path: self.path.clone(),
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            entries.push(PlatformEntry::new(code.trim(), description));
        }

        if entries.is_empty() {
            return Ok(None);
        }
        debug!(path = %self.path.display(), platforms = entries.len(), "loaded cached platform catalog");
        Ok(Some(PlatformCatalog::from_entries(entries)))
    }

    /// Replaces the cached catalog with `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::CatalogIo`] when the file cannot be written.
    pub fn save(&self, catalog: &PlatformCatalog) -> Result<(), ConfigurationError> {
        let content: String = catalog
            .iter()
            .map(|entry| format!("{};{}\n", entry.code, entry.description))
            .collect();
        fs::write(&self.path, content).map_err(|e| ConfigurationError::catalog_io(&self.path, e))?;
        debug!(path = %self.path.display(), platforms = catalog.len(), "saved platform catalog");
        Ok(())
    }
}
