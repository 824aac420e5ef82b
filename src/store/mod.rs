//! Palette persistence.
//!
//! Saved palettes live under a single key of a string key-value store, as a
//! JSON array. [`PaletteRepository`] is the only thing that reads or writes
//! that key; the stores themselves know nothing about palettes.

mod repository;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::error::{Result, SwatchError};

pub use repository::{PaletteRepository, PALETTES_KEY};

/// A string key-value store with whole-value replacement.
pub trait KeyValueStore {
    /// Read a value. A key that was never written reads as `None`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace a value. Readers observe either the old or the new value,
    /// never a mix.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SwatchError::Io {
            path: dir.clone(),
            message: format!("Failed to create store directory: {}", e),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SwatchError::Io {
                path,
                message: format!("Failed to read store: {}", e),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let io_err = |e: std::io::Error| SwatchError::Io {
            path: path.clone(),
            message: format!("Failed to write store: {}", e),
        };

        // Write beside the target and rename over it
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn poisoned() -> SwatchError {
    SwatchError::StoreCorrupt {
        message: "memory store lock poisoned".to_string(),
    }
}
