//! In-process cache store with per-entry TTL, used by tests and demos.
//! Expiry is lazy: entries are dropped on the read that finds them stale.

use crate::cache::CacheStore;
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// DashMap-backed cache store
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry count, counting stale entries not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        // Clone out before any removal so the shard lock is not held while
        // calling back into the map.
        let (bytes, expired) = match self.entries.get(key) {
            Some(entry) => (entry.bytes.clone(), entry.expires_at <= Instant::now()),
            None => return Ok(None),
        };

        if expired {
            self.entries.remove(key);
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                bytes: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
