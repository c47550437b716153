use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ModerationConfig, StorageConfig};
use crate::entity::{rice, rice_dotfiles, rice_preview};
use crate::error::AppError;
use crate::feed::PartialRiceRow;
use crate::models::auth::contains_blacklisted;
use crate::models::user::UserResponse;

/// Query parameters of the feed endpoint. The three `last*` fields are
/// the keyset cursor; clients copy them from the last row of the
/// previous page.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// One of `trending` (default), `recent`, `mostDownloads`, `mostStars`.
    pub sort: Option<String>,
    /// `id` of the last row of the previous page.
    pub last_id: Option<String>,
    /// `createdAt` of the last row, formatted
    /// `YYYY-MM-DDTHH:mm:ss.ssssss±HH:MM`. Read by `sort=recent`.
    pub last_created_at: Option<String>,
    /// `downloadCount` of the last row. Read by `sort=mostDownloads`.
    pub last_downloads: Option<String>,
}

/// One rice in a feed listing.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartialRice {
    pub id: Uuid,
    #[schema(example = "Gruvbox Sway")]
    pub title: String,
    #[schema(example = "gruvbox-sway")]
    pub slug: String,
    pub author_display_name: String,
    pub author_username: String,
    pub thumbnail_url: String,
    pub star_count: i64,
    pub download_count: i64,
    /// Whether the requesting viewer has starred this rice. Always
    /// `false` for anonymous requests.
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
}

impl PartialRice {
    pub fn from_row(row: PartialRiceRow, storage: &StorageConfig) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            author_display_name: row.display_name,
            author_username: row.username,
            thumbnail_url: format!("{}{}", storage.cdn_url, row.thumbnail),
            star_count: row.star_count,
            download_count: row.download_count,
            is_starred: row.is_starred,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RicePreviewResponse {
    pub id: Uuid,
    pub url: String,
}

impl RicePreviewResponse {
    pub fn from_model(preview: rice_preview::Model, storage: &StorageConfig) -> Self {
        Self {
            id: preview.id,
            url: format!("{}{}", storage.cdn_url, preview.file_path),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiceDotfilesResponse {
    pub file_url: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RiceDotfilesResponse {
    pub fn from_model(dotfiles: rice_dotfiles::Model, storage: &StorageConfig) -> Self {
        Self {
            file_url: format!("{}{}", storage.cdn_url, dotfiles.file_path),
            file_size: dotfiles.file_size,
            created_at: dotfiles.created_at,
            updated_at: dotfiles.updated_at,
        }
    }
}

/// Full rice detail with relations.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiceResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub download_count: i64,
    pub star_count: i64,
    pub is_starred: bool,
    pub previews: Vec<RicePreviewResponse>,
    pub dotfiles: RiceDotfilesResponse,
    pub author: UserResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

pub fn validate_title(title: &str, moderation: &ModerationConfig) -> Result<(), AppError> {
    let len = title.chars().count();
    if len < 4 || len > 32 {
        return Err(AppError::Validation("Title must be 4-32 characters".into()));
    }
    if !title
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | '_' | '-' | '[' | ']' | '(' | ')'))
    {
        return Err(AppError::Validation(
            "Title can contain only letters, digits, -, _, [], (), ' and whitespace".into(),
        ));
    }
    if contains_blacklisted(title, moderation) {
        return Err(AppError::Unprocessable(
            "Title contains blacklisted words".into(),
        ));
    }
    Ok(())
}

pub fn validate_description(
    description: &str,
    moderation: &ModerationConfig,
) -> Result<(), AppError> {
    let len = description.chars().count();
    if len < 4 || len > 10240 {
        return Err(AppError::Validation(
            "Description must be 4-10240 characters".into(),
        ));
    }
    if contains_blacklisted(description, moderation) {
        return Err(AppError::Unprocessable(
            "Description contains blacklisted words".into(),
        ));
    }
    Ok(())
}

pub fn validate_update_rice(
    payload: &UpdateRiceRequest,
    moderation: &ModerationConfig,
) -> Result<(), AppError> {
    if payload.title.is_none() && payload.description.is_none() {
        return Err(AppError::Validation(
            "At least one of title or description is required".into(),
        ));
    }
    if let Some(ref title) = payload.title {
        validate_title(title.trim(), moderation)?;
    }
    if let Some(ref description) = payload.description {
        validate_description(description, moderation)?;
    }
    Ok(())
}

impl From<rice::Model> for UpdateRiceSummary {
    fn from(model: rice::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Rice fields returned by create/update, before relations exist or
/// without re-fetching them.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRiceSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
