use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user report against a rice or a comment. Exactly one of
/// `rice_id` / `comment_id` is set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub reporter_id: Uuid,
    pub rice_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub is_closed: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
