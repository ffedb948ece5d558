//! Password reset token storage port.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Stores at most one hashed reset token per user, each with a TTL.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Store `token_hash` for `user_id`, replacing any previous token.
    async fn put(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<(), ResetTokenError>;

    /// Fetch the live token hash for `user_id`, if any.
    async fn get(&self, user_id: Uuid) -> Result<Option<String>, ResetTokenError>;

    /// Consume the token for `user_id`.
    async fn remove(&self, user_id: Uuid) -> Result<(), ResetTokenError>;
}

/// Reset token store errors.
#[derive(Debug, thiserror::Error)]
pub enum ResetTokenError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
