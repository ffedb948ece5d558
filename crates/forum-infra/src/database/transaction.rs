//! PostgreSQL transactions for ledger mutations.
//!
//! Row locks are taken with `SELECT ... FOR UPDATE`: first the post, then
//! the (post, user) vote. Every vote on a post therefore queues on that
//! post's row lock and reads the committed points of its predecessor.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, DbConn, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use forum_core::domain::{Post, Vote};
use forum_core::error::RepoError;
use forum_core::ports::{Transaction, UnitOfWork};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::vote::{self, Entity as VoteEntity};
use super::errors::map_db_err;

pub struct PostgresUnitOfWork {
    db: DbConn,
}

impl PostgresUnitOfWork {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        Ok(Box::new(PostgresTransaction { txn }))
    }
}

/// Rolls back on drop unless committed.
pub struct PostgresTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn lock_post(&mut self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_vote(
        &mut self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        VoteEntity::find_by_id((post_id, user_id))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?
            .map(Vote::try_from)
            .transpose()
    }

    async fn insert_vote(&mut self, vote: &Vote) -> Result<(), RepoError> {
        VoteEntity::insert(vote::ActiveModel::from(vote))
            .exec_without_returning(&self.txn)
            .await
            .map_err(|e| match map_db_err(e) {
                // Another transaction inserted the same pair first.
                RepoError::Constraint(msg) => RepoError::Conflict(msg),
                other => other,
            })?;
        Ok(())
    }

    async fn update_vote(&mut self, vote: &Vote) -> Result<(), RepoError> {
        let result = VoteEntity::update_many()
            .col_expr(vote::Column::Value, Expr::value(vote.value.as_i16()))
            .filter(vote::Column::PostId.eq(vote.post_id))
            .filter(vote::Column::UserId.eq(vote.user_id))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_points(&mut self, post_id: Uuid, points: i32) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Points, Expr::value(points))
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_votes_by_post(&mut self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = VoteEntity::delete_many()
            .filter(vote::Column::PostId.eq(post_id))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }

    async fn delete_post(&mut self, post_id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(post_id)
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.txn.commit().await.map_err(map_db_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        self.txn.rollback().await.map_err(map_db_err)
    }
}
