//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL
//! expiration. Used as a side-cache for scraped API responses: a miss is a
//! normal outcome, not an error.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_KEY_LENGTH};
use crate::error::{ApiError, Result};

// == Cache Store ==
/// Capacity-bounded cache with LRU eviction and per-entry TTL.
///
/// The payload type is opaque to the store; callers receive clones and can
/// never observe a partially written entry (all mutation happens behind the
/// owner's lock).
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `Some` only if the entry exists and is unexpired; a hit
    /// updates the recency order and last-accessed timestamp. An expired
    /// entry is removed on the spot and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch();
        let value = entry.value.clone();
        self.stats.record_hit();
        self.lru.touch(key);
        Some(value)
    }

    // == Put ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten and TTL is reset.
    /// If the insert would exceed capacity, expired entries are swept first
    /// and then least-recently-used entries are evicted until the bound
    /// holds.
    pub fn put(&mut self, key: String, value: V, ttl: Option<u64>) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(ApiError::InvalidRequest(format!(
                "Cache key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            // Expired entries go first, live LRU entries only if that was
            // not enough.
            self.cleanup_expired();
            while self.entries.len() >= self.max_entries {
                match self.lru.evict_oldest() {
                    Some(evicted_key) => {
                        self.entries.remove(&evicted_key);
                        self.stats.record_eviction();
                    }
                    None => break,
                }
            }
        }

        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value, effective_ttl);
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Invalidate ==
    /// Removes an entry by key.
    ///
    /// Returns true if an entry was removed; absence is not an error.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
