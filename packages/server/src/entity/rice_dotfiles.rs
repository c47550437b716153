use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The downloadable archive of a rice. Exactly one row per rice;
/// replaced in place when the author uploads a new archive.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rice_dotfiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub rice_id: Uuid,

    pub file_path: String,
    pub file_size: i64,
    pub download_count: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
