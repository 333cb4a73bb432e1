//! Redis cache. Every key is stored under a namespace so that clearing the
//! cache never touches data owned by other services sharing the instance.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use inkwell_core::ports::{Cache, CacheError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prepended as `<namespace>:` to every key.
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            namespace: "inkwell".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Redis-backed cache.
///
/// Uses connection manager for automatic reconnection. Read failures are logged
/// and reported as misses.
pub struct RedisCache {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, namespace = %config.namespace, "Connected to Redis cache");

        Ok(Self {
            conn,
            namespace: config.namespace,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    async fn delete_matching(&self, pattern: String) -> Result<usize, CacheError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;

        if keys.is_empty() {
            return Ok(0);
        }

        conn.del::<_, usize>(&keys)
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();

        match ttl {
            Some(duration) => {
                conn.set_ex::<_, _, ()>(self.key(key), value, duration.as_secs().max(1))
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
            None => {
                conn.set::<_, _, ()>(self.key(key), value)
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        self.delete_matching(format!("{}*", self.key(prefix))).await
    }
}
