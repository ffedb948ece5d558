//! In-memory reset token store - used when Redis is unavailable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use forum_core::ports::{ResetTokenError, ResetTokenStore};

struct Entry {
    token_hash: String,
    expires_at: Instant,
}

/// Per-process token store. Tokens are lost on restart.
#[derive(Default)]
pub struct InMemoryResetTokenStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl InMemoryResetTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResetTokenStore for InMemoryResetTokenStore {
    async fn put(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<(), ResetTokenError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            user_id,
            Entry {
                token_hash: token_hash.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>, ResetTokenError> {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(&user_id) else {
            return Ok(None);
        };

        if Instant::now() < entry.expires_at {
            return Ok(Some(entry.token_hash.clone()));
        }

        drop(entries);
        self.entries.write().await.remove(&user_id);
        Ok(None)
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), ResetTokenError> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }
}
