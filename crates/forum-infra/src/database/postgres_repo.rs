//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use forum_core::domain::{Post, User, Vote, mask_email};
use forum_core::error::RepoError;
use forum_core::ports::{BaseRepository, PostRepository, UserRepository, VoteRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::vote::{self, Entity as VoteEntity};
use super::errors::map_db_err;
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL vote repository (read side).
pub type PostgresVoteRepository = PostgresBaseRepository<VoteEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_page(
        &self,
        limit: u64,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit);

        if let Some(before) = before {
            query = query.filter(post::Column::CreatedAt.lt(before.fixed_offset()));
        }

        let result = query.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_oldest(&self) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_asc(post::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        PostEntity::find().count(&self.db).await.map_err(map_db_err)
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
    ) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Title, Expr::value(title))
            .col_expr(post::Column::Text, Expr::value(text))
            .col_expr(post::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        <Self as BaseRepository<Post, Uuid>>::find_by_id(self, id).await
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn find_by_post_and_user(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, RepoError> {
        VoteEntity::find_by_id((post_id, user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(Vote::try_from)
            .transpose()
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<Vec<Vote>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        VoteEntity::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PostId.is_in(post_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }

    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Vote>, RepoError> {
        VoteEntity::find()
            .filter(vote::Column::PostId.eq(post_id))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }
}
