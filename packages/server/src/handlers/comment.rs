use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{rice, rice_comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::comment::{
    AddCommentRequest, CommentResponse, CommentWithSlugResponse, CommentWithSlugRow,
    CommentWithUserResponse, CommentWithUserRow, UpdateCommentRequest, validate_comment_content,
};
use crate::state::AppState;
use crate::utils::{ban, rate_limit};

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<rice_comment::Model, AppError> {
    rice_comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Comments",
    operation_id = "addComment",
    summary = "Comment on a rice",
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Banned (USER_BANNED)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn add_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AddCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;
    rate_limit::check_write_rate_limit(
        &state.db,
        auth_user.user_id,
        state.config.moderation.writes_per_minute,
    )
    .await?;

    validate_comment_content(&payload.content)?;

    let exists = rice::Entity::find_by_id(payload.rice_id)
        .one(&state.db)
        .await?
        .is_some();
    if !exists {
        return Err(AppError::NotFound("Rice not found".into()));
    }

    let now = chrono::Utc::now();
    let comment = rice_comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        rice_id: Set(payload.rice_id),
        author_id: Set(auth_user.user_id),
        content: Set(payload.content),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // The rice could be deleted between the check and the insert; the
    // foreign key turns that race into a 404 rather than a 500.
    let model = comment.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::NotFound("Rice not found".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(model))))
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct CommentListQuery {
    /// Maximum number of comments returned.
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "Recent comments across all rices",
    params(CommentListQuery),
    responses(
        (status = 200, description = "Recent comments with author info", body = [CommentWithUserResponse]),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_comments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<Vec<CommentWithUserResponse>>, AppError> {
    auth_user.require_admin()?;

    // Fully qualified: the sea-orm prelude's ExprTrait also has a `min`.
    let limit = std::cmp::Ord::min(query.limit.unwrap_or(50), 200);
    let rows = rice_comment::Entity::find()
        .inner_join(user::Entity)
        .select_only()
        .column_as(rice_comment::Column::Id, "comment_id")
        .column(rice_comment::Column::Content)
        .column(user::Column::DisplayName)
        .column(user::Column::Username)
        .column(user::Column::AvatarPath)
        .column(rice_comment::Column::CreatedAt)
        .column(rice_comment::Column::UpdatedAt)
        .order_by_desc(rice_comment::Column::CreatedAt)
        .limit(limit)
        .into_model::<CommentWithUserRow>()
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| CommentWithUserResponse::from_row(row, &state.config.storage))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "One comment with a link back to its rice",
    responses(
        (status = 200, description = "The comment", body = CommentWithSlugResponse),
        (status = 404, description = "Unknown comment (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_comment(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentWithSlugResponse>, AppError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT c.id, c.rice_id, c.author_id, c.content,
                r.slug AS rice_slug, u.username AS rice_author_username,
                c.created_at, c.updated_at
         FROM rice_comments c
         JOIN rices r ON r.id = c.rice_id
         JOIN users u ON u.id = r.author_id
         WHERE c.id = $1",
        [id.into()],
    );

    let row = CommentWithSlugRow::find_by_statement(stmt)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

    Ok(Json(CommentWithSlugResponse::from(row)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown comment (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;
    validate_comment_content(&payload.content)?;

    let comment = find_comment(&state.db, id).await?;
    if comment.author_id != auth_user.user_id && !auth_user.is_admin {
        return Err(AppError::PermissionDenied);
    }

    let mut active: rice_comment::ActiveModel = comment.into();
    active.content = Set(payload.content);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(CommentResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown comment (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let comment = find_comment(&state.db, id).await?;
    if comment.author_id != auth_user.user_id && !auth_user.is_admin {
        return Err(AppError::PermissionDenied);
    }

    comment.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
