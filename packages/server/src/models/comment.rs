use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::entity::rice_comment;
use crate::error::AppError;
use crate::models::user::avatar_url;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub rice_id: Uuid,
    #[schema(example = "Love the bar colors, mind sharing the font?")]
    pub content: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub content: String,
}

pub fn validate_comment_content(content: &str) -> Result<(), AppError> {
    let len = content.chars().count();
    if len < 8 || len > 128 {
        return Err(AppError::Validation(
            "Comment must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub rice_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<rice_comment::Model> for CommentResponse {
    fn from(comment: rice_comment::Model) -> Self {
        Self {
            id: comment.id,
            rice_id: comment.rice_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Row shape for comment listings joined with the author.
#[derive(Debug, FromQueryResult)]
pub struct CommentWithUserRow {
    pub comment_id: Uuid,
    pub content: String,
    pub display_name: String,
    pub username: String,
    pub avatar_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithUserResponse {
    pub comment_id: Uuid,
    pub content: String,
    pub display_name: String,
    pub username: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentWithUserResponse {
    pub fn from_row(row: CommentWithUserRow, storage: &StorageConfig) -> Self {
        Self {
            comment_id: row.comment_id,
            content: row.content,
            display_name: row.display_name,
            username: row.username,
            avatar_url: avatar_url(storage, row.avatar_path.as_deref()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row shape for a single comment joined with its rice's slug and the
/// rice author's username, enough for a client to link back to the rice.
#[derive(Debug, FromQueryResult)]
pub struct CommentWithSlugRow {
    pub id: Uuid,
    pub rice_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub rice_slug: String,
    pub rice_author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithSlugResponse {
    pub id: Uuid,
    pub rice_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub rice_slug: String,
    pub rice_author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentWithSlugRow> for CommentWithSlugResponse {
    fn from(row: CommentWithSlugRow) -> Self {
        Self {
            id: row.id,
            rice_id: row.rice_id,
            author_id: row.author_id,
            content: row.content,
            rice_slug: row.rice_slug,
            rice_author_username: row.rice_author_username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
