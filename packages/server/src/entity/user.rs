use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub avatar_path: Option<String>,
    pub is_admin: bool,

    #[sea_orm(has_many)]
    pub rices: HasMany<super::rice::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::rice_comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
