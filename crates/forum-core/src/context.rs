//! Per-request context passed explicitly to every operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{User, VoteValue};
use crate::error::DomainError;
use crate::loader::{BatchFn, Loader};
use crate::ports::{UserRepository, VoteRepository};

/// Batches user lookups by id.
pub struct UserBatch {
    users: Arc<dyn UserRepository>,
}

impl UserBatch {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl BatchFn<Uuid, User> for UserBatch {
    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, User>, DomainError> {
        let users = self.users.find_by_ids(keys).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

/// Batches one user's vote directions by post id.
pub struct VoteTypeBatch {
    votes: Arc<dyn VoteRepository>,
    user_id: Uuid,
}

impl VoteTypeBatch {
    pub fn new(votes: Arc<dyn VoteRepository>, user_id: Uuid) -> Self {
        Self { votes, user_id }
    }
}

#[async_trait]
impl BatchFn<Uuid, VoteValue> for VoteTypeBatch {
    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, VoteValue>, DomainError> {
        let votes = self.votes.find_for_user(self.user_id, keys).await?;
        Ok(votes.into_iter().map(|v| (v.post_id, v.value)).collect())
    }
}

/// The authenticated caller plus request-scoped loaders.
pub struct RequestContext {
    pub caller: Option<Uuid>,
    pub users: Loader<Uuid, User>,
    vote_types: Option<Loader<Uuid, VoteValue>>,
}

impl RequestContext {
    pub fn new(
        caller: Option<Uuid>,
        users: Arc<dyn UserRepository>,
        votes: Arc<dyn VoteRepository>,
    ) -> Self {
        let vote_types = caller.map(|user_id| {
            let batch: Arc<dyn BatchFn<Uuid, VoteValue>> =
                Arc::new(VoteTypeBatch::new(votes, user_id));
            Loader::new(batch)
        });
        let user_batch: Arc<dyn BatchFn<Uuid, User>> = Arc::new(UserBatch::new(users));

        Self {
            caller,
            users: Loader::new(user_batch),
            vote_types,
        }
    }

    /// The caller's vote on each post as `1`, `-1`, or `0` for none.
    /// Anonymous callers get all zeros without touching the store.
    pub async fn vote_types(&self, post_ids: &[Uuid]) -> Result<Vec<i16>, DomainError> {
        let Some(loader) = &self.vote_types else {
            return Ok(vec![0; post_ids.len()]);
        };

        Ok(loader
            .load_many(post_ids)
            .await?
            .into_iter()
            .map(|v| v.map(VoteValue::as_i16).unwrap_or(0))
            .collect())
    }
}
