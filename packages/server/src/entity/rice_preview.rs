use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A screenshot of a rice. The earliest preview by `created_at` is
/// the rice's thumbnail in feed listings.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rice_previews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub rice_id: Uuid,
    #[sea_orm(belongs_to, from = "rice_id", to = "id")]
    pub rice: HasOne<super::rice::Entity>,

    pub file_path: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
