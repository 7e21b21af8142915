//! # Response Cache
//!
//! Soft-failing cache layer over a pluggable byte store. Store errors never
//! reach the caller: a failed read degrades to a miss and a failed write is
//! dropped, both logged. The pipeline treats the cache as an accelerator, not
//! a dependency.
//!
//! Keys embed a schema version, so changing the cached value shape
//! invalidates old entries implicitly instead of requiring a flush.

pub mod memory;

pub use memory::MemoryCacheStore;

use crate::constants::system::CACHE_SCHEMA_VERSION;
use crate::error::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Byte-level cache store contract
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;
}

/// Deterministic cache key for a response to the given input text.
///
/// The text is trimmed and lowercased before hashing so trivially different
/// spellings of the same message share an entry.
pub fn response_cache_key(text: &str) -> String {
    let normalized = text.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!(
        "resp:v{}:{}",
        CACHE_SCHEMA_VERSION,
        hex::encode(hasher.finalize())
    )
}

/// JSON-serializing cache facade with the degrade-to-miss contract
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Look up and deserialize a cached value. Any store or decode failure
    /// yields `None`.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Serialize and write a value under the default TTL. Failures are
    /// logged and dropped. A zero TTL disables writes entirely.
    pub async fn store<T: Serialize>(&self, key: &str, value: &T) {
        if self.default_ttl.is_zero() {
            debug!(key, "Cache writes disabled (zero TTL)");
            return;
        }

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        if let Err(e) = self.store.set(key, bytes, self.default_ttl).await {
            warn!(key, error = %e, "Cache write failed, continuing without");
        }
    }

    /// Whether the backing store currently answers reads. Used by health
    /// reporting, never by the request path.
    pub async fn is_reachable(&self) -> bool {
        self.store.get("health:probe").await.is_ok()
    }
}
