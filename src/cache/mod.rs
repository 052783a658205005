//! Cache module for persisting the fetched top list
//!
//! This module provides a string-keyed slot store (on disk or in memory) and a
//! `CacheStore` that keeps one timestamped envelope of the accumulated list in
//! it. Envelopes older than the TTL, or that fail to parse, are treated as
//! absent; write failures are logged and never reach the caller.

mod manager;
mod slot;

pub use manager::{CacheEnvelope, CacheStore, DEFAULT_CACHE_KEY, DEFAULT_TTL_MS};
pub use slot::{default_cache_dir, CacheError, FileSlotStore, MemorySlotStore, SlotStore};
