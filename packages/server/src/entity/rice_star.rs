use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rice_stars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub rice_id: Uuid,
    #[sea_orm(belongs_to, from = "rice_id", to = "id")]
    pub rice: HasOne<super::rice::Entity>,

    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
