use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user_ban;
use crate::error::AppError;

/// Find the user's active ban, if any.
///
/// A ban is active while it is not revoked and has no expiry or an
/// expiry in the future. Expired bans are left in place for the audit
/// trail rather than being revoked lazily.
pub async fn active_ban<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<user_ban::Model>, AppError> {
    let ban = user_ban::Entity::find()
        .filter(user_ban::Column::UserId.eq(user_id))
        .filter(user_ban::Column::IsRevoked.eq(false))
        .filter(
            Condition::any()
                .add(user_ban::Column::ExpiresAt.is_null())
                .add(user_ban::Column::ExpiresAt.gt(Utc::now())),
        )
        .one(db)
        .await?;

    Ok(ban)
}

/// Reject the request if the user has an active ban.
pub async fn ensure_not_banned<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<(), AppError> {
    if active_ban(db, user_id).await?.is_some() {
        return Err(AppError::UserBanned);
    }
    Ok(())
}
