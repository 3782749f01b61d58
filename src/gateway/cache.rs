//! TTL cache of structured model replies

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: i64,
    value: Value,
}

#[derive(Serialize)]
struct KeyParts<'a, C: ?Sized + Serialize> {
    prompt: &'a str,
    context: &'a C,
}

/// Build the cache key for a prompt and the context it was built from
///
/// The key is the JSON serialization of `{prompt, context}`.
pub fn cache_key<C: ?Sized + Serialize>(prompt: &str, context: &C) -> Result<String> {
    Ok(serde_json::to_string(&KeyParts { prompt, context })?)
}

/// Structured replies keyed by prompt and context
///
/// Entries older than the TTL are evicted when looked up and swept on
/// every insert.
#[derive(Debug)]
pub struct ResponseCache {
    ttl_ms: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: ttl.as_millis() as i64,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, evicting it if it has expired
    pub fn get(&self, key: &str, now_ms: i64) -> Option<Value> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now_ms - entry.stored_at < self.ttl_ms => Some(entry.value.clone()),
            Some(_) => {
                tracing::debug!("Cache entry expired, evicting");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a structured reply, dropping any expired entries
    pub fn insert(&self, key: String, value: Value, now_ms: i64) {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now_ms - entry.stored_at < self.ttl_ms);
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, "Swept expired cache entries");
        }
        entries.insert(
            key,
            CacheEntry {
                stored_at: now_ms,
                value,
            },
        );
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
