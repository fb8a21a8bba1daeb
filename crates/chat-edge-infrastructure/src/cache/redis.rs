//! Redis-backed key-value store, shared by every instance of the edge.

use async_trait::async_trait;
use chat_edge_core::{DomainError, KeyValueStore};
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use tracing::{error, info};

#[derive(Clone)]
pub struct RedisKeyValueStore {
    pool: Pool,
}

impl RedisKeyValueStore {
    pub fn new(url: &str, max_connections: usize) -> Result<Self, DomainError> {
        info!("Initializing Redis pool (max {} connections)", max_connections);

        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_connections.max(1)));

        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            error!("Failed to create Redis pool: {}", e);
            DomainError::Storage(e.to_string())
        })?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<Connection, DomainError> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::Storage(format!("redis pool: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| DomainError::Storage(format!("redis GET {}: {}", key, e)))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds.max(1))
            .await
            .map_err(|e| DomainError::Storage(format!("redis SETEX {}: {}", key, e)))?;
        Ok(())
    }
}
