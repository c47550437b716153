use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use sea_orm::sea_query::{Expr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{report, rice, rice_comment, rice_star, user, user_ban};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::json::AppJson;
use crate::feed::{PartialRiceRow, build_user_rices_statement};
use crate::models::auth::contains_blacklisted;
use crate::models::rice::PartialRice;
use crate::models::user::{
    BanResponse, BanUserRequest, DeleteUserRequest, UpdateDisplayNameRequest,
    UpdatePasswordRequest, UserListQuery, UserResponse, validate_ban_request,
    validate_display_name, validate_update_password,
};
use crate::state::AppState;
use crate::utils::{ban, hash};

async fn find_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "Look up or list users",
    description = "With `username`, performs a public exact-match lookup and returns \
                   zero or one users. Without it, lists accounts newest first, or \
                   currently banned accounts with `status=banned`; listings require \
                   an admin token.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Matching users", body = [UserResponse]),
        (status = 400, description = "Unknown status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Listing without a token (TOKEN_MISSING)", body = ErrorBody),
        (status = 403, description = "Listing without admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_users(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let storage = &state.config.storage;

    if let Some(username) = query.username.as_deref().filter(|u| !u.is_empty()) {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&state.db)
            .await?;
        return Ok(Json(
            found
                .map(|u| UserResponse::from_model(u, storage))
                .into_iter()
                .collect(),
        ));
    }

    // Listings expose account inventory, so they are admin-only. The
    // viewer extractor only carries an id; the admin flag comes from
    // the store so a stale token cannot grant access.
    let viewer_id = viewer.ok_or(AppError::TokenMissing)?;
    let viewer_row = find_user(&state.db, viewer_id).await?;
    if !viewer_row.is_admin {
        return Err(AppError::PermissionDenied);
    }

    // Fully qualified: the sea-orm prelude's ExprTrait also has a `min`.
    let limit = std::cmp::Ord::min(query.limit.unwrap_or(50), 200);
    let select = match query.status.as_deref() {
        Some("banned") => {
            let banned_ids = SeaQuery::select()
                .column(user_ban::Column::UserId)
                .from(user_ban::Entity)
                .and_where(Expr::col(user_ban::Column::IsRevoked).eq(false))
                .and_where(
                    Expr::col(user_ban::Column::ExpiresAt)
                        .is_null()
                        .or(Expr::col(user_ban::Column::ExpiresAt).gt(Utc::now())),
                )
                .to_owned();
            user::Entity::find().filter(user::Column::Id.in_subquery(banned_ids))
        }
        None => user::Entity::find(),
        Some(_) => {
            return Err(AppError::Validation(
                "Unsupported status filter, expected `banned`".into(),
            ));
        }
    };

    let users = select
        .order_by_desc(user::Column::CreatedAt)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse::from_model(u, storage))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Account info by id",
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self_or_admin(id)?;
    let user = find_user(&state.db, id).await?;
    Ok(Json(UserResponse::from_model(user, &state.config.storage)))
}

#[utoipa::path(
    get,
    path = "/{id}/rices",
    tag = "Users",
    operation_id = "getUserRices",
    summary = "All rices published by a user, newest first",
    responses(
        (status = 200, description = "The user's rices", body = [PartialRice]),
        (status = 404, description = "Unknown user (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer))]
pub async fn get_user_rices(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartialRice>>, AppError> {
    find_user(&state.db, id).await?;

    let stmt = build_user_rices_statement(id, viewer);
    let rows = PartialRiceRow::find_by_statement(stmt).all(&state.db).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| PartialRice::from_row(row, &state.config.storage))
            .collect(),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}/display-name",
    tag = "Users",
    operation_id = "updateDisplayName",
    summary = "Change the display name",
    request_body = UpdateDisplayNameRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Blacklisted words (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_display_name(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateDisplayNameRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self_or_admin(id)?;

    let display_name = payload.display_name.trim().to_string();
    validate_display_name(&display_name)?;
    if contains_blacklisted(&display_name, &state.config.moderation) {
        return Err(AppError::Unprocessable(
            "Display name contains blacklisted words".into(),
        ));
    }

    let user = find_user(&state.db, id).await?;
    let mut active: user::ActiveModel = user.into();
    active.display_name = Set(display_name);
    active.updated_at = Set(Utc::now());
    let user = active.update(&state.db).await?;

    Ok(Json(UserResponse::from_model(user, &state.config.storage)))
}

#[utoipa::path(
    patch,
    path = "/{id}/password",
    tag = "Users",
    operation_id = "updatePassword",
    summary = "Change the password",
    description = "Non-admin callers must supply their current password; admins \
                   resetting someone else's password skip that check.",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong old password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<StatusCode, AppError> {
    auth_user.require_self_or_admin(id)?;
    validate_update_password(&payload)?;

    let user = find_user(&state.db, id).await?;

    if !auth_user.is_admin || auth_user.user_id == id {
        let is_valid = hash::verify_password(&payload.old_password, &user.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }
    }

    let password_hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password_hash);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    Ok(StatusCode::OK)
}

async fn read_avatar(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some("avatar") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::Validation("Missing `avatar` file field".into()))
}

#[utoipa::path(
    post,
    path = "/{id}/avatar",
    tag = "Users",
    operation_id = "uploadAvatar",
    summary = "Upload a profile picture",
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Not an image (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn upload_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self_or_admin(id)?;
    let user = find_user(&state.db, id).await?;

    let data = read_avatar(multipart).await?;
    let ext = crate::utils::upload::sniff_image(&data).ok_or_else(|| {
        AppError::Unprocessable("Unsupported avatar type, expected an image".into())
    })?;

    let path = format!("avatars/{}.{}", Uuid::new_v4(), ext);
    state.media.put(&path, &data).await?;

    let old_path = user.avatar_path.clone();
    let mut active: user::ActiveModel = user.into();
    active.avatar_path = Set(Some(path.clone()));
    active.updated_at = Set(Utc::now());
    let user = match active.update(&state.db).await {
        Ok(user) => user,
        Err(e) => {
            if let Err(e) = state.media.delete(&path).await {
                tracing::warn!("Failed to clean up avatar {path}: {e}");
            }
            return Err(e.into());
        }
    };

    if let Some(old) = old_path {
        if let Err(e) = state.media.delete(&old).await {
            tracing::warn!("Failed to remove replaced avatar {old}: {e}");
        }
    }

    Ok(Json(UserResponse::from_model(user, &state.config.storage)))
}

#[utoipa::path(
    delete,
    path = "/{id}/avatar",
    tag = "Users",
    operation_id = "deleteAvatar",
    summary = "Remove the profile picture",
    description = "The avatar URL falls back to the configured default afterwards.",
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self_or_admin(id)?;
    let user = find_user(&state.db, id).await?;

    let old_path = user.avatar_path.clone();
    let mut active: user::ActiveModel = user.into();
    active.avatar_path = Set(None);
    active.updated_at = Set(Utc::now());
    let user = active.update(&state.db).await?;

    if let Some(old) = old_path {
        if let Err(e) = state.media.delete(&old).await {
            tracing::warn!("Failed to remove avatar {old}: {e}");
        }
    }

    Ok(Json(UserResponse::from_model(user, &state.config.storage)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete an account and everything it published",
    description = "Self-deletion requires the account password typed again; \
                   admins deleting another account skip that check.",
    request_body = DeleteUserRequest,
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Not yourself (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<DeleteUserRequest>,
) -> Result<StatusCode, AppError> {
    auth_user.require_self_or_admin(id)?;
    let user = find_user(&state.db, id).await?;

    if auth_user.user_id == id {
        let is_valid = hash::verify_password(&payload.password, &user.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }
    }

    // Published rices are removed one by one so their media files go too.
    let rices = rice::Entity::find()
        .filter(rice::Column::AuthorId.eq(id))
        .all(&state.db)
        .await?;
    for r in rices {
        super::rice::purge_rice(&state, r.id).await?;
    }

    let txn = state.db.begin().await?;
    rice_star::Entity::delete_many()
        .filter(rice_star::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    rice_comment::Entity::delete_many()
        .filter(rice_comment::Column::AuthorId.eq(id))
        .exec(&txn)
        .await?;
    report::Entity::delete_many()
        .filter(report::Column::ReporterId.eq(id))
        .exec(&txn)
        .await?;
    user_ban::Entity::delete_many()
        .filter(user_ban::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    if let Some(avatar) = user.avatar_path {
        if let Err(e) = state.media.delete(&avatar).await {
            tracing::warn!("Failed to remove avatar {avatar}: {e}");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/ban",
    tag = "Users",
    operation_id = "banUser",
    summary = "Ban a user",
    description = "Banning an admin strips their admin flag. Bans without a \
                   duration are permanent until revoked.",
    request_body = BanUserRequest,
    responses(
        (status = 201, description = "Ban created", body = BanResponse),
        (status = 400, description = "Validation error or self-ban (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown user (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already banned (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(admin_id = %auth_user.user_id))]
pub async fn ban_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<BanUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_ban_request(&payload)?;

    if auth_user.user_id == id {
        return Err(AppError::Validation("You cannot ban yourself".into()));
    }

    let target = find_user(&state.db, id).await?;

    if ban::active_ban(&state.db, id).await?.is_some() {
        return Err(AppError::Conflict("User is already banned".into()));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    if target.is_admin {
        let mut active: user::ActiveModel = target.into();
        active.is_admin = Set(false);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }

    let ban_row = user_ban::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(id),
        admin_id: Set(auth_user.user_id),
        reason: Set(payload.reason.trim().to_string()),
        is_revoked: Set(false),
        expires_at: Set(payload.duration_hours.map(|h| now + Duration::hours(h))),
        banned_at: Set(now),
        revoked_at: Set(None),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(BanResponse::from(ban_row))))
}

#[utoipa::path(
    delete,
    path = "/{id}/ban",
    tag = "Users",
    operation_id = "unbanUser",
    summary = "Revoke a user's active ban",
    responses(
        (status = 204, description = "Ban revoked"),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No active ban (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(admin_id = %auth_user.user_id))]
pub async fn unban_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let active_ban = ban::active_ban(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User has no active ban".into()))?;

    let mut active: user_ban::ActiveModel = active_ban.into();
    active.is_revoked = Set(true);
    active.revoked_at = Set(Some(Utc::now()));
    active.update(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
