//! Key-value blob storage for cache snapshots.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::{MuninnError, Result};

/// Storage key of the name→symbol cache snapshot.
pub const NAME_TO_SYMBOL_KEY: &str = "ticker_name_to_symbol";

/// Storage key of the symbol→name cache snapshot.
pub const SYMBOL_TO_NAME_KEY: &str = "ticker_symbol_to_name";

/// Minimal persistence seam: whole-blob read and write by key.
pub trait BlobStore: Send + Sync {
    /// Read a blob. A missing key is `Ok(None)`, not an error.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, blob: &str) -> Result<()>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.blobs.lock().unwrap_or_else(|poisoned| {
            warn!("memory store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        self.lock().insert(key.to_owned(), blob.to_owned());
        Ok(())
    }
}

/// One `<key>.json` file per blob inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform cache directory (`<cache_dir>/muninn`).
    pub fn default_location() -> Result<Self> {
        Self::default_dir().map(Self::new).ok_or_else(|| {
            MuninnError::Configuration("no platform cache directory available".into())
        })
    }

    /// `<cache_dir>/muninn`, e.g. `~/.cache/muninn` on Linux.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("muninn"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(MuninnError::InvalidInput(format!(
                "invalid storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MuninnError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            MuninnError::Storage(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)
            .map_err(|e| MuninnError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| {
            MuninnError::Storage(format!("failed to replace {}: {e}", path.display()))
        })?;

        debug!(key, path = %path.display(), bytes = blob.len(), "blob written");
        Ok(())
    }
}
