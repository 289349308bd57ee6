//! Redis-backed implementation of the `Cache` port.
//!
//! Uses `bb8-redis` for pooled async connections. Values are stored as
//! JSON strings with `SET ... EX`; the coordinator above decides what the
//! TTL is and what a failure means, so every error here is a plain
//! `Backend` message.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;

use crate::domain::ports::{Cache, CacheError, CacheKey};

/// Configuration for the Redis connection pool.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    redis_url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl CacheConfig {
    /// Create a new configuration with the given Redis URL.
    ///
    /// Defaults to 10 connections and a 5 second checkout timeout.
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Get the Redis URL.
    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// Redis adapter for the `Cache` port.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCache {
    /// Connect to Redis with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the URL is invalid or the pool
    /// cannot be built.
    pub async fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())
            .map_err(|err| CacheError::backend(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.get(key.as_str())
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.set_ex::<_, _, ()>(key.as_str(), value, ttl.as_secs())
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::backend(err.to_string()))?;
        conn.del::<_, ()>(key.as_str())
            .await
            .map_err(|err| CacheError::backend(err.to_string()))
    }
}
