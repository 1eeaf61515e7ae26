use moka::Expiry;
use moka::future::Cache as MokaCache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MEMORY_CAPACITY: u64 = 10_000;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("timed out connecting to redis after {0:?}")]
    ConnectTimeout(Duration),
}

/// Backing key/value store for serialized cache entries.
#[derive(Clone)]
pub enum CacheStorage {
    Redis(ConnectionManager),
    Memory(MemoryStorage),
}

impl fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStorage::Redis(_) => f.write_str("CacheStorage::Redis"),
            CacheStorage::Memory(memory) => f
                .debug_tuple("CacheStorage::Memory")
                .field(&memory.entries.entry_count())
                .finish(),
        }
    }
}

impl CacheStorage {
    /// Connects to redis and verifies the connection with a PING.
    pub async fn connect_redis(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let mut manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::ConnectTimeout(CONNECT_TIMEOUT))??;

        redis::cmd("PING")
            .query_async::<_, String>(&mut manager)
            .await?;

        Ok(CacheStorage::Redis(manager))
    }

    pub fn memory() -> Self {
        CacheStorage::Memory(MemoryStorage::new())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            CacheStorage::Redis(manager) => {
                let mut conn = manager.clone();
                Ok(conn.get::<_, Option<String>>(key).await?)
            }
            CacheStorage::Memory(memory) => Ok(memory.get(key).await),
        }
    }

    /// Stores `value` under `key`; a zero `ttl` leaves the key absent.
    pub async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheStorage::Redis(manager) => {
                let mut conn = manager.clone();
                if ttl.as_secs() == 0 {
                    // SETEX rejects a zero expiry; an entry that expires immediately is a delete.
                    conn.del::<_, i64>(key).await?;
                } else {
                    conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
                }
                Ok(())
            }
            CacheStorage::Memory(memory) => {
                memory.insert(key, value, ttl).await;
                Ok(())
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheStorage::Redis(manager) => {
                let mut conn = manager.clone();
                conn.del::<_, i64>(key).await?;
                Ok(())
            }
            CacheStorage::Memory(memory) => {
                memory.entries.invalidate(key).await;
                Ok(())
            }
        }
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        match self {
            CacheStorage::Redis(manager) => {
                let mut conn = manager.clone();
                redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn).await?;
                Ok(())
            }
            CacheStorage::Memory(memory) => {
                memory.entries.invalidate_all();
                Ok(())
            }
        }
    }
}

/// Expires each entry after the TTL it was written with.
struct EntryTtl;

impl Expiry<String, (String, Duration)> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &(String, Duration),
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// In-process store; moka evicts each entry once its TTL elapses.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: MokaCache<String, (String, Duration)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder()
                .max_capacity(MEMORY_CAPACITY)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await.map(|(value, _)| value)
    }

    async fn insert(&self, key: &str, value: String, ttl: Duration) {
        if ttl.is_zero() {
            self.entries.invalidate(key).await;
            return;
        }
        self.entries.insert(key.to_string(), (value, ttl)).await;
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}
