// src/cache/tiered.rs
// =============================================================================
// A versioned, TTL-bound, two-tier cache.
//
// Tier 1 is a process-memory map. Tier 2 is a DurableStore holding the same
// entries serialized as JSON. Reads go memory first, then durable; a durable
// hit is promoted back into memory.
//
// An entry is usable only when BOTH hold:
//   - entry.schema_version == the cache's schema version
//   - now - entry.written_at < ttl
// Anything else reads as a miss. Invalid entries are left where they are
// (lazy eviction); the fetcher still wants them as a last-resort fallback.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::durable::DurableStore;
use crate::clock::Clock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub schema_version: u32,
    pub payload: T,
    pub written_at: DateTime<Utc>,
}

pub struct TieredCache<T> {
    namespace: String,
    schema_version: u32,
    ttl: Duration,
    memory: RwLock<HashMap<String, CacheEntry<T>>>,
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
}

impl<T> TieredCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn new(
        namespace: impl Into<String>,
        schema_version: u32,
        ttl: Duration,
        durable: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            schema_version,
            ttl,
            memory: RwLock::new(HashMap::new()),
            durable,
            clock,
        }
    }

    /// Returns the entry for `key` only if it passes the version and TTL check.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now();

        if let Some(entry) = self.memory.read().get(key) {
            if self.is_usable(entry, now) {
                debug!(cache = %self.namespace, key, "memory hit");
                return Some(entry.clone());
            }
        }

        let entry = self.read_durable(key)?;
        if !self.is_usable(&entry, now) {
            debug!(cache = %self.namespace, key, "durable entry expired or outdated");
            return None;
        }

        debug!(cache = %self.namespace, key, "durable hit");
        self.memory.write().insert(key.to_string(), entry.clone());
        Some(entry)
    }

    /// Like `get`, but ignores the TTL. The schema version must still match.
    pub fn get_stale(&self, key: &str) -> Option<CacheEntry<T>> {
        if let Some(entry) = self.memory.read().get(key) {
            if entry.schema_version == self.schema_version {
                return Some(entry.clone());
            }
        }

        self.read_durable(key)
            .filter(|entry| entry.schema_version == self.schema_version)
    }

    /// Writes a fresh entry through both tiers.
    pub fn put(&self, key: &str, payload: T) {
        let entry = CacheEntry {
            schema_version: self.schema_version,
            payload,
            written_at: self.clock.now(),
        };
        self.restore(key, entry);
    }

    /// Installs an existing entry in both tiers, keeping its timestamp.
    pub fn restore(&self, key: &str, entry: CacheEntry<T>) {
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.durable.write(&self.durable_key(key), &raw) {
                    warn!(cache = %self.namespace, key, error = %e, "durable write failed");
                }
            }
            Err(e) => warn!(cache = %self.namespace, key, error = %e, "could not serialize entry"),
        }

        self.memory.write().insert(key.to_string(), entry);
    }

    /// Drops `key` from both tiers.
    pub fn invalidate(&self, key: &str) {
        self.memory.write().remove(key);
        if let Err(e) = self.durable.remove(&self.durable_key(key)) {
            warn!(cache = %self.namespace, key, error = %e, "durable remove failed");
        }
    }

    fn is_usable(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        if entry.schema_version != self.schema_version {
            return false;
        }
        // An entry from the future (clock skew) counts as brand new
        match (now - entry.written_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    fn read_durable(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.durable.read(&self.durable_key(key)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(cache = %self.namespace, key, error = %e, "durable read failed");
                return None;
            }
        };

        // A payload written by an older schema may not even deserialize;
        // that is the same as a version mismatch
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(cache = %self.namespace, key, error = %e, "unreadable durable entry");
                None
            }
        }
    }

    fn durable_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}
