//! Post CRUD with author-only edits and cascading deletes.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::{PostRepository, Transaction, UnitOfWork};
use crate::validation::validate_post_content;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { posts, uow }
    }

    pub async fn create(
        &self,
        caller: Option<Uuid>,
        title: &str,
        text: &str,
    ) -> Result<Post, DomainError> {
        let author_id = caller.ok_or(DomainError::Unauthorized)?;
        check_content(title, text)?;

        let post = self
            .posts
            .insert(Post::new(author_id, title.to_string(), text.to_string()))
            .await?;

        tracing::info!(post_id = %post.id, %author_id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.find_by_id(id).await?)
    }

    /// Rewrite title and text. Only the author may do this.
    pub async fn update(
        &self,
        caller: Option<Uuid>,
        id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<Post, DomainError> {
        let user_id = caller.ok_or(DomainError::Unauthorized)?;
        check_content(title, text)?;

        let existing = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))?;

        if !existing.is_authored_by(user_id) {
            tracing::warn!(post_id = %id, %user_id, "Rejected update by non-author");
            return Err(DomainError::Unauthorized);
        }

        let updated = self
            .posts
            .update_content(id, title, text)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))?;

        tracing::info!(post_id = %id, "Post updated");
        Ok(updated)
    }

    /// Delete a post and every vote on it, atomically. Returns the number of
    /// votes removed.
    pub async fn delete(&self, caller: Option<Uuid>, id: Uuid) -> Result<u64, DomainError> {
        let user_id = caller.ok_or(DomainError::Unauthorized)?;

        let mut tx = self.uow.begin().await?;
        let outcome = delete_in(tx.as_mut(), id, user_id).await;

        match outcome {
            Ok(removed) => {
                tx.commit().await?;
                tracing::info!(post_id = %id, votes_removed = removed, "Post deleted");
                Ok(removed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(post_id = %id, error = %rollback_err, "Delete rollback failed");
                }
                Err(err)
            }
        }
    }
}

async fn delete_in(
    tx: &mut dyn Transaction,
    id: Uuid,
    user_id: Uuid,
) -> Result<u64, DomainError> {
    let post = tx
        .lock_post(id)
        .await?
        .ok_or_else(|| DomainError::post_not_found(id))?;

    if !post.is_authored_by(user_id) {
        tracing::warn!(post_id = %id, %user_id, "Rejected delete by non-author");
        return Err(DomainError::Unauthorized);
    }

    let removed = tx.delete_votes_by_post(id).await?;
    tx.delete_post(id).await?;
    Ok(removed)
}

fn check_content(title: &str, text: &str) -> Result<(), DomainError> {
    let errors = validate_post_content(title, text);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors))
    }
}
