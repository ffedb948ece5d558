//! Vote entity for SeaORM. One row per (post, user).

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use forum_core::domain::VoteValue;
use forum_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    /// `1` or `-1`.
    pub value: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Rows are constrained to ±1; anything else is a corrupt ledger.
impl TryFrom<Model> for forum_core::domain::Vote {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let value = VoteValue::try_from(model.value)
            .map_err(|e| RepoError::Query(format!("corrupt vote row: {e}")))?;
        Ok(Self::new(model.post_id, model.user_id, value))
    }
}

impl From<&forum_core::domain::Vote> for ActiveModel {
    fn from(vote: &forum_core::domain::Vote) -> Self {
        Self {
            post_id: Set(vote.post_id),
            user_id: Set(vote.user_id),
            value: Set(vote.value.as_i16()),
        }
    }
}
