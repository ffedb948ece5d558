//! Transaction port - the atomic boundary around ledger mutations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, Vote};
use crate::error::RepoError;

/// An open transaction over post and vote rows.
///
/// Reads through [`lock_post`](Transaction::lock_post) and
/// [`find_vote`](Transaction::find_vote) hold their rows until the
/// transaction ends. Dropping without commit rolls back.
#[async_trait]
pub trait Transaction: Send {
    /// Load a post and hold its row lock.
    async fn lock_post(&mut self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Load the `(post_id, user_id)` vote and hold its row lock.
    async fn find_vote(&mut self, post_id: Uuid, user_id: Uuid)
    -> Result<Option<Vote>, RepoError>;

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepoError>;

    async fn update_vote(&mut self, vote: &Vote) -> Result<(), RepoError>;

    /// Persist a post's points. No other column is written.
    async fn set_points(&mut self, post_id: Uuid, points: i32) -> Result<(), RepoError>;

    /// Returns the number of removed votes.
    async fn delete_votes_by_post(&mut self, post_id: Uuid) -> Result<u64, RepoError>;

    async fn delete_post(&mut self, post_id: Uuid) -> Result<(), RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}

/// Factory for [`Transaction`]s.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepoError>;
}
