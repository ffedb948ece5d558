//! Vote ledger: one vote per (post, user) and an incrementally maintained
//! post score.
//!
//! Every change to a post's points goes through [`VoteLedger::apply_vote`],
//! which keeps `post.points == sum(vote.value)` for the post. The whole
//! read-decide-write sequence runs in one [`Transaction`] holding the post
//! row lock, so concurrent votes on the same post serialise instead of
//! losing updates. Conflicts surface as [`DomainError::Transient`]; nothing
//! here retries.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Post, Vote, VoteValue};
use crate::error::DomainError;
use crate::ports::{Transaction, UnitOfWork};

/// Ledger transition for an incoming vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    /// No prior vote: insert a row.
    Cast,
    /// Prior vote in the opposite direction: rewrite the row in place.
    Flip,
    /// Prior vote in the same direction: touch nothing.
    Unchanged,
}

impl VoteTransition {
    pub fn decide(existing: Option<VoteValue>, incoming: VoteValue) -> Self {
        match existing {
            None => VoteTransition::Cast,
            Some(prev) if prev != incoming => VoteTransition::Flip,
            Some(_) => VoteTransition::Unchanged,
        }
    }

    /// Change to the post's points. A flip removes the old contribution and
    /// adds the new one, which nets to twice the incoming value.
    pub fn points_delta(self, incoming: VoteValue) -> i32 {
        match self {
            VoteTransition::Cast => incoming.delta(),
            VoteTransition::Flip => 2 * incoming.delta(),
            VoteTransition::Unchanged => 0,
        }
    }
}

pub struct VoteLedger {
    uow: Arc<dyn UnitOfWork>,
}

impl VoteLedger {
    pub fn new(uow: Arc<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Record `caller`'s vote on `post_id` and return the post with its
    /// updated points.
    pub async fn apply_vote(
        &self,
        caller: Option<Uuid>,
        post_id: Uuid,
        value: VoteValue,
    ) -> Result<Post, DomainError> {
        let user_id = caller.ok_or(DomainError::Unauthorized)?;

        let mut tx = self.uow.begin().await?;
        match apply_in(tx.as_mut(), post_id, user_id, value).await {
            Ok(post) => {
                tx.commit().await?;
                Ok(post)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(%post_id, error = %rollback_err, "Vote rollback failed");
                }
                Err(err)
            }
        }
    }
}

async fn apply_in(
    tx: &mut dyn Transaction,
    post_id: Uuid,
    user_id: Uuid,
    value: VoteValue,
) -> Result<Post, DomainError> {
    let mut post = tx
        .lock_post(post_id)
        .await?
        .ok_or_else(|| DomainError::post_not_found(post_id))?;

    let existing = tx.find_vote(post_id, user_id).await?;
    let transition = VoteTransition::decide(existing.map(|v| v.value), value);

    let vote = Vote::new(post_id, user_id, value);
    match transition {
        VoteTransition::Cast => tx.insert_vote(&vote).await?,
        VoteTransition::Flip => tx.update_vote(&vote).await?,
        VoteTransition::Unchanged => {
            tracing::debug!(%post_id, %user_id, "Repeat vote ignored");
            return Ok(post);
        }
    }

    post.points += transition.points_delta(value);
    tx.set_points(post_id, post.points).await?;

    tracing::info!(
        %post_id,
        %user_id,
        ?transition,
        points = post.points,
        "Vote applied"
    );

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_transitions() {
        use VoteValue::*;

        assert_eq!(VoteTransition::decide(None, Upvote), VoteTransition::Cast);
        assert_eq!(VoteTransition::decide(Some(Downvote), Upvote), VoteTransition::Flip);
        assert_eq!(VoteTransition::decide(Some(Upvote), Downvote), VoteTransition::Flip);
        assert_eq!(
            VoteTransition::decide(Some(Upvote), Upvote),
            VoteTransition::Unchanged
        );
    }

    #[test]
    fn test_points_delta() {
        use VoteValue::*;

        assert_eq!(VoteTransition::Cast.points_delta(Downvote), -1);
        assert_eq!(VoteTransition::Flip.points_delta(Downvote), -2);
        assert_eq!(VoteTransition::Flip.points_delta(Upvote), 2);
        assert_eq!(VoteTransition::Unchanged.points_delta(Upvote), 0);
    }
}
