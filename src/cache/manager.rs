//! Time-limited cache of the accumulated top list
//!
//! Provides a `CacheStore` that keeps a single versioned envelope in a slot
//! store. The envelope is rebuilt in memory and written back whole on every
//! successful page fetch, and is treated as absent once it is older than the TTL.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::slot::{CacheError, SlotStore};
use crate::data::ListItem;

/// Default slot key; bump the suffix when the envelope layout changes
pub const DEFAULT_CACHE_KEY: &str = "anime_top_cache_v2";

/// Default time-to-live in milliseconds (one hour)
pub const DEFAULT_TTL_MS: i64 = 60 * 60 * 1000;

/// Snapshot of the accumulated list as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Unix time of the write, in milliseconds
    pub written_at_ms: i64,
    /// All items fetched so far, in page order
    pub items: Vec<ListItem>,
    /// Highest page index merged into `items`
    pub highest_page: u32,
}

impl CacheEnvelope {
    /// When the envelope was written, if the timestamp is representable
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.written_at_ms).single()
    }
}

/// Reads and writes the cached list envelope
pub struct CacheStore {
    slot: Box<dyn SlotStore>,
    key: String,
    ttl_ms: i64,
}

impl CacheStore {
    /// Creates a cache over `slot` with the default key and TTL
    pub fn new(slot: Box<dyn SlotStore>) -> Self {
        Self {
            slot,
            key: DEFAULT_CACHE_KEY.to_string(),
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = ttl.num_milliseconds();
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::milliseconds(self.ttl_ms)
    }

    /// Reads the envelope, if present, parseable and younger than the TTL
    pub fn read(&self) -> Option<CacheEnvelope> {
        self.read_at(now_ms())
    }

    /// Like [`read`](Self::read) with an explicit current time in milliseconds
    pub fn read_at(&self, now_ms: i64) -> Option<CacheEnvelope> {
        let raw = match self.slot.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cache");
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring malformed cache entry");
                return None;
            }
        };

        let Some(age_ms) = now_ms.checked_sub(envelope.written_at_ms) else {
            warn!(
                key = %self.key,
                written_at_ms = envelope.written_at_ms,
                "Ignoring cache entry with unusable timestamp"
            );
            return None;
        };
        if age_ms >= self.ttl_ms {
            debug!(key = %self.key, age_ms, "Cache expired");
            return None;
        }

        debug!(
            key = %self.key,
            items = envelope.items.len(),
            pages = envelope.highest_page,
            "Cache hit"
        );
        Some(envelope)
    }

    /// Persists a freshly fetched page
    ///
    /// The first page replaces the envelope. Later pages are appended to a
    /// still-valid envelope; if none is valid they start a new one. Failures are
    /// logged and swallowed: caching never fails the fetch it follows.
    pub fn write(&self, new_items: &[ListItem], page: u32, is_first_page: bool) {
        self.write_at(new_items, page, is_first_page, now_ms());
    }

    /// Like [`write`](Self::write) with an explicit current time in milliseconds
    pub fn write_at(&self, new_items: &[ListItem], page: u32, is_first_page: bool, now_ms: i64) {
        let merged = if is_first_page {
            None
        } else {
            self.read_at(now_ms)
        };

        let envelope = match merged {
            Some(mut current) => {
                current.items.extend_from_slice(new_items);
                CacheEnvelope {
                    written_at_ms: now_ms,
                    items: current.items,
                    highest_page: current.highest_page.max(page),
                }
            }
            None => CacheEnvelope {
                written_at_ms: now_ms,
                items: new_items.to_vec(),
                highest_page: page,
            },
        };

        if let Err(e) = self.persist(&envelope) {
            warn!(key = %self.key, page, error = %e, "Failed to write cache; continuing without it");
        }
    }

    /// Removes the stored envelope
    pub fn clear(&self) {
        if let Err(e) = self.slot.remove(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear cache");
        } else {
            debug!(key = %self.key, "Cache cleared");
        }
    }

    fn persist(&self, envelope: &CacheEnvelope) -> Result<(), CacheError> {
        let json = serde_json::to_string(envelope)?;
        self.slot.set(&self.key, &json)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
