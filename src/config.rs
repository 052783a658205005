//! Runtime configuration
//!
//! Everything that used to be a fixed constant (API base URL, timeout, cache
//! key and TTL, theme key) is collected here and passed to the components
//! that need it.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::cache::{
    default_cache_dir, CacheStore, FileSlotStore, MemorySlotStore, SlotStore, DEFAULT_CACHE_KEY,
    DEFAULT_TTL_MS,
};
use crate::data::jikan::{DEFAULT_REQUEST_TIMEOUT, JIKAN_BASE_URL};
use crate::data::JikanClient;
use crate::theme::{ThemeStore, DEFAULT_THEME_KEY};

/// Settings shared by the library components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Jikan API base URL
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long a cached list stays valid
    pub cache_ttl: chrono::Duration,
    /// Slot key of the list cache
    pub cache_key: String,
    /// Slot key of the theme preference
    pub theme_key: String,
    /// Cache directory; `None` uses the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// Whether the list cache and theme are kept on disk
    pub persist_cache: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: JIKAN_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: chrono::Duration::milliseconds(DEFAULT_TTL_MS),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            theme_key: DEFAULT_THEME_KEY.to_string(),
            cache_dir: None,
            persist_cache: true,
        }
    }
}

impl AppConfig {
    /// Directory used for the cache and the log file, if one can be determined
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(default_cache_dir)
    }

    /// Builds the slot store backing the cache and theme
    ///
    /// Falls back to a session-only memory store when persistence is off or no
    /// cache directory is available.
    pub fn slot_store(&self) -> Box<dyn SlotStore> {
        if !self.persist_cache {
            return Box::new(MemorySlotStore::new());
        }
        match self.resolved_cache_dir() {
            Some(dir) => Box::new(FileSlotStore::with_dir(dir)),
            None => {
                warn!("No cache directory available; caching for this session only");
                Box::new(MemorySlotStore::new())
            }
        }
    }

    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(self.slot_store())
            .with_key(self.cache_key.clone())
            .with_ttl(self.cache_ttl)
    }

    pub fn theme_store(&self) -> ThemeStore {
        ThemeStore::new(self.slot_store()).with_key(self.theme_key.clone())
    }

    pub fn client(&self) -> JikanClient {
        JikanClient::with_base_url(self.base_url.clone()).with_request_timeout(self.request_timeout)
    }
}
