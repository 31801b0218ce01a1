//! # Storage
//!
//! Where glitched images end up.
//!
//! ## Backends
//! - `FileStore` - Writes next to the source image
//! - `MemoryStore` - For testing

use crate::error::GlitchError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Trait for glitch storage backends
pub trait GlitchStore: Send + Sync {
    /// Persist `data` under `name`, derived from the `source` image path.
    ///
    /// Returns the path the image was written to.
    fn save(&self, source: &Path, name: &str, data: &[u8]) -> Result<PathBuf, GlitchError>;
}

impl<T: GlitchStore + ?Sized> GlitchStore for Arc<T> {
    fn save(&self, source: &Path, name: &str, data: &[u8]) -> Result<PathBuf, GlitchError> {
        (**self).save(source, name, data)
    }
}

/// `<source dir>/<name>.<source ext>`
///
/// The extension is appended rather than substituted so names that
/// contain dots keep them.
pub fn output_path(source: &Path, name: &str) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let file_name = match source.extension() {
        Some(ext) => format!("{}.{}", name, ext.to_string_lossy()),
        None => name.to_string(),
    };
    dir.join(file_name)
}

/// Writes glitches into the source image's directory
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl GlitchStore for FileStore {
    fn save(&self, source: &Path, name: &str, data: &[u8]) -> Result<PathBuf, GlitchError> {
        let path = output_path(source, name);
        std::fs::write(&path, data).map_err(|source| GlitchError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// A saved glitch held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedGlitch {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// In-memory store
///
/// Records every save in order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<SavedGlitch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, oldest first
    pub fn saved(&self) -> Vec<SavedGlitch> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }

    /// File stems of everything saved so far, oldest first
    pub fn names(&self) -> Vec<String> {
        self.saved()
            .iter()
            .filter_map(|s| s.path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect()
    }
}

impl GlitchStore for MemoryStore {
    fn save(&self, source: &Path, name: &str, data: &[u8]) -> Result<PathBuf, GlitchError> {
        let path = output_path(source, name);
        let mut saved = self.saved.lock().map_err(|_| GlitchError::Write {
            path: path.clone(),
            source: std::io::Error::other("memory store lock poisoned"),
        })?;

        saved.push(SavedGlitch {
            path: path.clone(),
            data: data.to_vec(),
        });
        Ok(path)
    }
}
