use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entity::{user, user_ban};
use crate::error::AppError;

/// Public URL of a user's avatar, falling back to the configured default.
pub fn avatar_url(storage: &StorageConfig, avatar_path: Option<&str>) -> String {
    match avatar_path {
        Some(path) => format!("{}{}", storage.cdn_url, path),
        None => format!("{}{}", storage.cdn_url, storage.default_avatar),
    }
}

/// Public view of a user account. The password hash and raw avatar
/// path never leave the server.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "nixrice")]
    pub username: String,
    #[schema(example = "Nix Ricer")]
    pub display_name: String,
    pub avatar_url: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_model(user: user::Model, storage: &StorageConfig) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: avatar_url(storage, user.avatar_path.as_deref()),
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query parameters for `GET /users`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Look up a single user by exact username.
    pub username: Option<String>,
    /// `banned` restricts the listing to currently banned users (admin only).
    pub status: Option<String>,
    /// Maximum number of users returned (admin listings only).
    pub limit: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisplayNameRequest {
    #[schema(example = "Nix Ricer")]
    pub display_name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub fn validate_update_password(payload: &UpdatePasswordRequest) -> Result<(), AppError> {
    if payload.new_password.chars().count() < 6 || payload.new_password.chars().count() > 256 {
        return Err(AppError::Validation(
            "Password must be 6-256 characters".into(),
        ));
    }
    Ok(())
}

/// Account deletion requires the password typed again.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeleteUserRequest {
    pub password: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BanUserRequest {
    #[schema(example = "Repeated spam uploads")]
    pub reason: String,
    /// Ban duration in hours. Absent means permanent.
    pub duration_hours: Option<i64>,
}

pub fn validate_ban_request(payload: &BanUserRequest) -> Result<(), AppError> {
    let len = payload.reason.chars().count();
    if len < 4 || len > 1024 {
        return Err(AppError::Validation(
            "Ban reason must be 4-1024 characters".into(),
        ));
    }
    if let Some(hours) = payload.duration_hours
        && hours <= 0
    {
        return Err(AppError::Validation(
            "Ban duration must be a positive number of hours".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BanResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    /// Absent for permanent bans.
    pub expires_at: Option<DateTime<Utc>>,
    pub banned_at: DateTime<Utc>,
}

impl From<user_ban::Model> for BanResponse {
    fn from(ban: user_ban::Model) -> Self {
        Self {
            id: ban.id,
            user_id: ban.user_id,
            reason: ban.reason,
            expires_at: ban.expires_at,
            banned_at: ban.banned_at,
        }
    }
}

/// Shared display-name validation: used on registration and rename.
pub fn validate_display_name(display_name: &str) -> Result<(), AppError> {
    let len = display_name.chars().count();
    if len < 3 || len > 20 {
        return Err(AppError::Validation(
            "Display name must be 3-20 characters".into(),
        ));
    }
    if !display_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.'))
    {
        return Err(AppError::Validation(
            "Display name can contain only letters, digits, whitespace, dot, underscore and dash"
                .into(),
        ));
    }
    Ok(())
}
