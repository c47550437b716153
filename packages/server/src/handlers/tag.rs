use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::entity::tag;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::tag::{TagNameRequest, TagResponse, validate_tag_name};
use crate::state::AppState;

fn tag_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists".into())
        }
        _ => AppError::from(e),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "All tags, alphabetical",
    responses((status = 200, description = "All tags", body = [TagResponse])),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = TagNameRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TagNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let name = payload.name.trim().to_lowercase();
    validate_tag_name(&name)?;

    let now = chrono::Utc::now();
    let model = tag::ActiveModel {
        name: Set(name),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(tag_conflict)?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    request_body = TagNameRequest,
    responses(
        (status = 200, description = "Updated tag", body = TagResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown tag (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TagNameRequest>,
) -> Result<Json<TagResponse>, AppError> {
    auth_user.require_admin()?;

    let name = payload.name.trim().to_lowercase();
    validate_tag_name(&name)?;

    let tag = tag::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))?;

    let mut active: tag::ActiveModel = tag.into();
    active.name = Set(name);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await.map_err(tag_conflict)?;

    Ok(Json(TagResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown tag (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let tag = tag::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))?;

    tag.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
