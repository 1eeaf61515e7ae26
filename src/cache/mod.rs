pub mod storage;
pub mod types;

pub use storage::{CacheError, CacheStorage, MemoryStorage};
pub use types::CacheKey;

use crate::config::{CacheBackendKind, CacheSettings};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Cache-aside facade over the backing store.
///
/// Every failure degrades to a negative result: `get` reports absent, the
/// mutating calls report `false`. When the store was unreachable at startup the
/// cache is disabled and behaves as a permanent miss.
#[derive(Clone, Debug)]
pub struct Cache {
    storage: Option<CacheStorage>,
    default_ttl: Duration,
}

impl Cache {
    /// Connects to the configured backend; an unreachable redis yields a disabled cache.
    pub async fn connect(settings: &CacheSettings) -> Self {
        match settings.backend {
            CacheBackendKind::Memory => {
                info!("Using in-process cache");
                Self::new(CacheStorage::memory(), settings.default_ttl)
            }
            CacheBackendKind::Redis => {
                let url = settings.redis.connection_url();
                match CacheStorage::connect_redis(&url).await {
                    Ok(storage) => {
                        info!(
                            host = %settings.redis.host,
                            port = settings.redis.port,
                            db = settings.redis.db,
                            "Redis cache initialized successfully"
                        );
                        Self::new(storage, settings.default_ttl)
                    }
                    Err(e) => {
                        warn!("Redis connection failed: {}. Cache will be disabled.", e);
                        Self::disabled(settings.default_ttl)
                    }
                }
            }
        }
    }

    pub fn new(storage: CacheStorage, default_ttl: Duration) -> Self {
        Self {
            storage: Some(storage),
            default_ttl,
        }
    }

    pub fn disabled(default_ttl: Duration) -> Self {
        Self {
            storage: None,
            default_ttl,
        }
    }

    pub fn enabled(&self) -> bool {
        self.storage.is_some()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage = self.storage.as_ref()?;

        let raw = match storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache MISS for key: {}", key);
                return None;
            }
            Err(e) => {
                error!("Cache get error for key {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache HIT for key: {}", key);
                Some(value)
            }
            Err(e) => {
                error!("Cache get error for key {}: {}", key, e);
                None
            }
        }
    }

    /// Stores `value` for `ttl`, or the configured default when `ttl` is `None`.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("Cache set error for key {}: {}", key, e);
                return false;
            }
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        match storage.set_ex(key, serialized, ttl).await {
            Ok(()) => {
                debug!("Cache SET for key: {} with TTL: {}s", key, ttl.as_secs());
                true
            }
            Err(e) => {
                error!("Cache set error for key {}: {}", key, e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        match storage.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                error!("Cache delete error for key {}: {}", key, e);
                false
            }
        }
    }

    /// Removes every entry in the backing store.
    pub async fn clear(&self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };

        match storage.clear().await {
            Ok(()) => {
                info!("Cache cleared");
                true
            }
            Err(e) => {
                error!("Cache clear error: {}", e);
                false
            }
        }
    }

    pub async fn get_key<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        self.get(&key.to_string()).await
    }

    /// Writes under `key` with that key's TTL policy.
    pub async fn set_key<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> bool {
        self.set(&key.to_string(), value, Some(key.ttl())).await
    }
}
