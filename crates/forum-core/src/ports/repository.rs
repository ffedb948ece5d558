use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, User, Vote};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Updates go through dedicated methods.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Batch lookup. Missing ids are simply absent from the result.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError>;
}

/// Post repository. Reads plus content edits; points and deletion go through
/// a [`Transaction`](super::Transaction).
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Up to `limit` posts strictly older than `before`, newest first.
    async fn find_page(
        &self,
        limit: u64,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, RepoError>;

    /// The single oldest post, if any.
    async fn find_oldest(&self) -> Result<Option<Post>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;

    /// Rewrite title and text only. Returns the updated post.
    async fn update_content(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<Option<Post>, RepoError>;
}

/// Read side of the vote ledger.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find_by_post_and_user(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, RepoError>;

    /// All of `user_id`'s votes among `post_ids`.
    async fn find_for_user(&self, user_id: Uuid, post_ids: &[Uuid])
    -> Result<Vec<Vote>, RepoError>;

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Vote>, RepoError>;
}
