//! Redis reset token store. Expiry is delegated to Redis key TTLs.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use forum_core::ports::{ResetTokenError, ResetTokenStore};

const KEY_PREFIX: &str = "forum:reset-token:";

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// `None` when `REDIS_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok()?;
        Some(Self {
            url,
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        })
    }
}

pub struct RedisResetTokenStore {
    conn: ConnectionManager,
}

impl RedisResetTokenStore {
    pub async fn new(config: &RedisConfig) -> Result<Self, ResetTokenError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| ResetTokenError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| ResetTokenError::Connection("Connection timed out".to_string()))?
            .map_err(|e| ResetTokenError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis reset token store");

        Ok(Self { conn })
    }

    fn key(user_id: Uuid) -> String {
        format!("{KEY_PREFIX}{user_id}")
    }
}

fn op_err(e: redis::RedisError) -> ResetTokenError {
    if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        ResetTokenError::Connection(e.to_string())
    } else {
        ResetTokenError::Operation(e.to_string())
    }
}

#[async_trait]
impl ResetTokenStore for RedisResetTokenStore {
    async fn put(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<(), ResetTokenError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero TTL
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(Self::key(user_id), token_hash, secs)
            .await
            .map_err(op_err)
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>, ResetTokenError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(Self::key(user_id))
            .await
            .map_err(op_err)
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), ResetTokenError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(user_id)).await.map_err(op_err)
    }
}
