use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A moderation ban. A user is banned while a row exists with
/// `is_revoked = false` and an `expires_at` that is NULL or in the
/// future. Revoked rows are kept for the audit trail.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_bans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub admin_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub is_revoked: bool,
    pub expires_at: Option<DateTimeUtc>,

    pub banned_at: DateTimeUtc,
    pub revoked_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
