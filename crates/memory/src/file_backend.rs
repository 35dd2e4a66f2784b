//! File-based slot store: persistent JSON object storage.
//!
//! All slots live in a single JSON object (`{"key": value, ...}`), loaded
//! on creation and rewritten on every save. Slots are tiny and written at
//! most once per turn, so a full rewrite is cheap.
//!
//! Storage location: `~/.soulturn/slots.json` unless configured otherwise.

use soulturn_core::error::MemoryError;
use soulturn_core::memory::SlotStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// A file-backed slot store.
///
/// Reads are served from memory; every save flushes the whole map to disk.
pub struct FileSlots {
    path: PathBuf,
    slots: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl FileSlots {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty (created on first write). A corrupted file
    /// is moved aside to `<name>.corrupt` and the store starts empty.
    pub fn new(path: PathBuf) -> Self {
        let slots = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = slots.len(), "File slot store loaded");
        Self {
            path,
            slots: RwLock::new(slots),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> BTreeMap<String, serde_json::Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&content) {
            Ok(slots) => slots,
            Err(e) => {
                let aside = Self::corrupt_path(path);
                match std::fs::rename(path, &aside) {
                    Ok(()) => warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Corrupted slot file moved aside"
                    ),
                    Err(rename_err) => warn!(
                        path = %path.display(),
                        error = %e,
                        rename_error = %rename_err,
                        "Corrupted slot file could not be moved aside"
                    ),
                }
                BTreeMap::new()
            }
        }
    }

    /// `slots.json` → `slots.json.corrupt`
    fn corrupt_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn flush(&self, slots: &BTreeMap<String, serde_json::Value>) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("Failed to create slot directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(slots)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize slots: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| MemoryError::Storage(format!("Failed to write slot file: {e}")))
    }
}

impl SlotStore for FileSlots {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, MemoryError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, value: serde_json::Value) -> Result<(), MemoryError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut updated = slots.clone();
        updated.insert(key.to_string(), value);
        // Only a value that reached disk becomes visible
        self.flush(&updated)?;
        *slots = updated;
        Ok(())
    }
}
