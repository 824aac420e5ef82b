//! Repository over the saved palette collection.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info};

use crate::error::{Result, SwatchError};
use crate::types::PaletteEntry;

use super::KeyValueStore;

/// The store key holding every saved palette.
pub const PALETTES_KEY: &str = "palettes";

/// Read-all / write-all access to saved palettes.
///
/// The collection is a JSON array in insertion order. Every mutation reads
/// the whole array, changes it, and writes the whole array back.
pub struct PaletteRepository<S> {
    store: S,
}

impl<S: KeyValueStore> PaletteRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the collection, reporting a malformed one as
    /// [`SwatchError::StoreCorrupt`].
    pub fn try_read_all(&self) -> Result<Vec<PaletteEntry>> {
        match self.store.get(PALETTES_KEY)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json).map_err(|e| SwatchError::StoreCorrupt {
                message: e.to_string(),
            }),
        }
    }

    /// Read the collection. Missing or malformed collections read as empty;
    /// the next write replaces a malformed one.
    pub fn read_all(&self) -> Result<Vec<PaletteEntry>> {
        match self.try_read_all() {
            Err(SwatchError::StoreCorrupt { message }) => {
                error!("palette store is corrupt, starting empty: {}", message);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Replace the whole collection.
    pub fn write_all(&self, entries: &[PaletteEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| SwatchError::StoreCorrupt {
            message: format!("failed to encode palettes: {}", e),
        })?;
        self.store.set(PALETTES_KEY, &json)
    }

    /// Append an entry.
    pub fn commit(&self, entry: PaletteEntry) -> Result<()> {
        let mut entries = self.read_all()?;
        info!("saving palette {} ({} colours)", entry.id, entry.colors.len());
        entries.push(entry);
        self.write_all(&entries)
    }

    /// Look up one entry.
    pub fn get(&self, id: &str) -> Result<Option<PaletteEntry>> {
        Ok(self.read_all()?.into_iter().find(|e| e.id == id))
    }

    /// Remove every entry with `id`. Returns whether anything was removed;
    /// when nothing matches the store is left untouched.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.read_all()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);

        if entries.len() == before {
            return Ok(false);
        }

        self.write_all(&entries)?;
        Ok(true)
    }

    /// A fresh identifier not used by any saved entry.
    pub fn next_id(&self) -> Result<String> {
        let taken: HashSet<String> = self.read_all()?.into_iter().map(|e| e.id).collect();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut candidate = now;
        loop {
            let id = format!("{:x}", candidate);
            if !taken.contains(&id) {
                return Ok(id);
            }
            candidate = candidate.wrapping_add(1);
        }
    }
}
