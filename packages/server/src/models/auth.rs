use serde::{Deserialize, Serialize};

use crate::config::ModerationConfig;
use crate::error::AppError;
use crate::models::user::{UserResponse, validate_display_name};

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Unique username (4-14 chars, alphanumeric).
    #[schema(example = "nixrice")]
    pub username: String,
    /// Name shown on profiles and feeds (3-20 chars).
    #[schema(example = "Nix Ricer")]
    pub display_name: String,
    /// Password (6-512 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Case-insensitive substring check against the configured word list.
pub fn contains_blacklisted(text: &str, moderation: &ModerationConfig) -> bool {
    let lowered = text.to_lowercase();
    moderation
        .blacklisted_words
        .iter()
        .any(|word| lowered.contains(&word.to_lowercase()))
}

pub fn validate_register_request(
    payload: &RegisterRequest,
    moderation: &ModerationConfig,
) -> Result<(), AppError> {
    let username = payload.username.trim();
    let len = username.chars().count();
    if len < 4 || len > 14 {
        return Err(AppError::Validation(
            "Username must be 4-14 characters".into(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "Username must contain only letters and digits".into(),
        ));
    }

    validate_display_name(payload.display_name.trim())?;

    let pw_len = payload.password.chars().count();
    if pw_len < 6 || pw_len > 512 {
        return Err(AppError::Validation(
            "Password must be 6-512 characters".into(),
        ));
    }

    if contains_blacklisted(username, moderation)
        || contains_blacklisted(payload.display_name.trim(), moderation)
    {
        return Err(AppError::Unprocessable(
            "Username or display name contains blacklisted words".into(),
        ));
    }

    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "nixrice")]
    pub username: String,
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}
