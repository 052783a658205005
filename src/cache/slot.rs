//! String-keyed slot stores backing the cache
//!
//! A slot store holds one string value per key. The file-backed store keeps
//! each slot as `<key>.json` in an XDG-compliant cache directory; the memory
//! store keeps slots for the lifetime of the process only.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by slot stores and envelope serialization
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be (de)serialized
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The in-memory store's lock was poisoned by a panicking writer
    #[error("Cache store is unavailable")]
    Unavailable,
}

/// A single string-keyed, string-valued store
pub trait SlotStore: Send {
    /// Returns the stored value, or `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replaces the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Removes the value stored under `key`; absent keys are not an error
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Stores slots as JSON files in a cache directory
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    /// Directory where slot files are stored
    cache_dir: PathBuf,
}

impl FileSlotStore {
    /// Creates a store in the XDG cache directory
    ///
    /// Uses `~/.cache/topanime/` on Linux, or the equivalent path on other platforms.
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        default_cache_dir().map(Self::with_dir)
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the file for the given key
    fn slot_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file and renames it over the slot, so readers
    /// see either the old value or the new one
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let path = self.slot_path(key);
        let tmp_path = self.cache_dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps slots in memory; clones share the same slots
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let slots = self.slots.lock().map_err(|_| CacheError::Unavailable)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Unavailable)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut slots = self.slots.lock().map_err(|_| CacheError::Unavailable)?;
        slots.remove(key);
        Ok(())
    }
}

/// XDG cache directory for this application, if a home directory exists
pub fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "topanime")?;
    Some(project_dirs.cache_dir().to_path_buf())
}
