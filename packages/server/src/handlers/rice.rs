use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{report, rice, rice_comment, rice_dotfiles, rice_preview, rice_star, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::json::AppJson;
use crate::feed::{FeedCursor, PartialRiceRow, SortMode, build_feed_statement};
use crate::models::comment::{CommentWithUserResponse, CommentWithUserRow};
use crate::models::rice::{
    FeedQuery, PartialRice, RiceDotfilesResponse, RicePreviewResponse, RiceResponse,
    UpdateRiceRequest, UpdateRiceSummary, validate_description, validate_title,
    validate_update_rice,
};
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::{ban, upload};

/// Find a rice by ID or return 404.
async fn find_rice<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<rice::Model, AppError> {
    rice::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rice not found".into()))
}

/// Authors may modify their own rices; admins may modify any.
fn ensure_can_modify(auth_user: &AuthUser, rice: &rice::Model) -> Result<(), AppError> {
    if auth_user.is_admin || rice.author_id == auth_user.user_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Rices",
    operation_id = "fetchRices",
    summary = "Ranked rice feed with keyset pagination",
    description = "Returns up to 20 rices ordered by the requested sort mode. \
                   To fetch the next page, resubmit the last row's own fields as \
                   `lastId`, `lastCreatedAt` and `lastDownloads`. A bearer token \
                   is optional; it only fills in `isStarred`.",
    params(FeedQuery),
    responses(
        (status = 200, description = "One page of the feed", body = [PartialRice]),
        (status = 400, description = "Bad sort mode or cursor (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn fetch_rices(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PartialRice>>, AppError> {
    let mode = SortMode::from_query(query.sort.as_deref())?;
    let cursor = FeedCursor::parse(
        query.last_id.as_deref(),
        query.last_created_at.as_deref(),
        query.last_downloads.as_deref(),
    )?;

    let stmt = build_feed_statement(mode, &cursor, viewer);
    let rows = PartialRiceRow::find_by_statement(stmt).all(&state.db).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| PartialRice::from_row(row, &state.config.storage))
            .collect(),
    ))
}

/// Assemble the full rice detail response.
async fn rice_detail(
    state: &AppState,
    rice: rice::Model,
    viewer: Option<Uuid>,
) -> Result<RiceResponse, AppError> {
    let author = user::Entity::find_by_id(rice.author_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Rice {} has no author row", rice.id)))?;

    let dotfiles = rice_dotfiles::Entity::find_by_id(rice.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Rice {} has no dotfiles row", rice.id)))?;

    let previews = rice_preview::Entity::find()
        .filter(rice_preview::Column::RiceId.eq(rice.id))
        .order_by_asc(rice_preview::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let star_count = rice_star::Entity::find()
        .filter(rice_star::Column::RiceId.eq(rice.id))
        .count(&state.db)
        .await?;

    let is_starred = match viewer {
        Some(viewer_id) => rice_star::Entity::find_by_id((rice.id, viewer_id))
            .one(&state.db)
            .await?
            .is_some(),
        None => false,
    };

    let storage = &state.config.storage;
    Ok(RiceResponse {
        id: rice.id,
        title: rice.title,
        slug: rice.slug,
        description: rice.description,
        download_count: dotfiles.download_count,
        star_count: star_count as i64,
        is_starred,
        previews: previews
            .into_iter()
            .map(|p| RicePreviewResponse::from_model(p, storage))
            .collect(),
        dotfiles: RiceDotfilesResponse::from_model(dotfiles, storage),
        author: UserResponse::from_model(author, storage),
        created_at: rice.created_at,
        updated_at: rice.updated_at,
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Rices",
    operation_id = "getRice",
    summary = "Full rice detail",
    responses(
        (status = 200, description = "Rice with relations", body = RiceResponse),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer))]
pub async fn get_rice(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RiceResponse>, AppError> {
    let rice = find_rice(&state.db, id).await?;
    Ok(Json(rice_detail(&state, rice, viewer).await?))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Rices",
    operation_id = "getRiceComments",
    summary = "Comments on a rice, newest first",
    responses(
        (status = 200, description = "Comments with author info", body = [CommentWithUserResponse]),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_rice_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CommentWithUserResponse>>, AppError> {
    find_rice(&state.db, id).await?;

    let rows = rice_comment::Entity::find()
        .filter(rice_comment::Column::RiceId.eq(id))
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
    path = "/{id}/dotfiles",
    tag = "Rices",
    operation_id = "downloadDotfiles",
    summary = "Download the rice's archive",
    description = "Increments the download counter and redirects to the public file URL.",
    responses(
        (status = 302, description = "Redirect to the archive"),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_dotfiles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Atomic increment-and-fetch; 0 rows means the rice doesn't exist.
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "UPDATE rice_dotfiles df
         SET download_count = download_count + 1, updated_at = now()
         FROM rices r
         WHERE r.id = $1 AND r.id = df.rice_id
         RETURNING df.file_path",
        [id.into()],
    );

    let row = state
        .db
        .query_one_raw(stmt)
        .await?
        .ok_or_else(|| AppError::NotFound("Rice not found".into()))?;
    let file_path: String = row.try_get("", "file_path")?;

    let url = format!("{}{}", state.config.storage.cdn_url, file_path);
    Ok((StatusCode::FOUND, [("Location", url)]))
}

/// Parsed fields of the rice creation form.
struct CreateRiceForm {
    title: String,
    description: String,
    previews: Vec<Vec<u8>>,
    dotfiles: Option<Vec<u8>>,
}

async fn read_create_form(mut multipart: Multipart) -> Result<CreateRiceForm, AppError> {
    let mut form = CreateRiceForm {
        title: String::new(),
        description: String::new(),
        previews: Vec::new(),
        dotfiles: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                form.title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            "description" => {
                form.description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            "previews" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                form.previews.push(bytes.to_vec());
            }
            "dotfiles" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                form.dotfiles = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Rices",
    operation_id = "createRice",
    summary = "Publish a new rice",
    description = "Multipart form with `title`, `description`, one or more `previews` \
                   images and a `dotfiles` archive.",
    responses(
        (status = 201, description = "Rice created", body = UpdateRiceSummary),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Title already in use (CONFLICT)", body = ErrorBody),
        (status = 413, description = "Too many previews (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Blacklisted words or bad file type (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn create_rice(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;

    let form = read_create_form(multipart).await?;

    let title = form.title.trim().to_string();
    validate_title(&title, &state.config.moderation)?;
    validate_description(&form.description, &state.config.moderation)?;

    if form.previews.is_empty() {
        return Err(AppError::Validation(
            "At least one preview image is required".into(),
        ));
    }
    let max_previews = state.config.storage.max_previews as usize;
    if form.previews.len() > max_previews {
        return Err(AppError::PayloadTooLarge(format!(
            "At most {max_previews} preview images are allowed"
        )));
    }
    let dotfiles_data = form
        .dotfiles
        .ok_or_else(|| AppError::Validation("A dotfiles archive is required".into()))?;

    // Sniff everything before writing anything.
    let mut preview_files = Vec::with_capacity(form.previews.len());
    for data in &form.previews {
        let ext = upload::sniff_image(data).ok_or_else(|| {
            AppError::Unprocessable("Unsupported preview type, expected an image".into())
        })?;
        preview_files.push((format!("previews/{}.{}", Uuid::new_v4(), ext), data));
    }
    let archive_ext = upload::sniff_archive(&dotfiles_data).ok_or_else(|| {
        AppError::Unprocessable("Unsupported dotfiles type, expected an archive".into())
    })?;
    let dotfiles_path = format!("dotfiles/{}.{}", Uuid::new_v4(), archive_ext);

    let mut written: Vec<String> = Vec::new();
    let store_result: Result<(), AppError> = async {
        for (path, data) in &preview_files {
            state.media.put(path, data).await?;
            written.push(path.clone());
        }
        state.media.put(&dotfiles_path, &dotfiles_data).await?;
        written.push(dotfiles_path.clone());
        Ok(())
    }
    .await;

    if let Err(e) = store_result {
        cleanup_media(&state, &written).await;
        return Err(e);
    }

    let slug = crate::utils::slug::slugify(&title);
    let now = chrono::Utc::now();
    let rice_id = Uuid::new_v4();

    let insert_result: Result<rice::Model, AppError> = async {
        let txn = state.db.begin().await?;

        let new_rice = rice::ActiveModel {
            id: Set(rice_id),
            author_id: Set(auth_user.user_id),
            title: Set(title.clone()),
            slug: Set(slug.clone()),
            description: Set(form.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = new_rice.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("A rice with this title already exists".into())
            }
            _ => AppError::from(e),
        })?;

        for (path, _) in &preview_files {
            rice_preview::ActiveModel {
                id: Set(Uuid::new_v4()),
                rice_id: Set(rice_id),
                file_path: Set(path.clone()),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        rice_dotfiles::ActiveModel {
            rice_id: Set(rice_id),
            file_path: Set(dotfiles_path.clone()),
            file_size: Set(dotfiles_data.len() as i64),
            download_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }
    .await;

    match insert_result {
        Ok(model) => Ok((StatusCode::CREATED, Json(UpdateRiceSummary::from(model)))),
        Err(e) => {
            cleanup_media(&state, &written).await;
            Err(e)
        }
    }
}

/// Best-effort removal of media files after a failed or superseded write.
async fn cleanup_media(state: &AppState, paths: &[String]) {
    for path in paths {
        if let Err(e) = state.media.delete(path).await {
            tracing::warn!("Failed to clean up media file {path}: {e}");
        }
    }
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Rices",
    operation_id = "updateRice",
    summary = "Edit a rice's title or description",
    request_body = UpdateRiceRequest,
    responses(
        (status = 200, description = "Updated rice", body = UpdateRiceSummary),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_rice(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRiceRequest>,
) -> Result<Json<UpdateRiceSummary>, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;
    validate_update_rice(&payload, &state.config.moderation)?;

    let rice = find_rice(&state.db, id).await?;
    ensure_can_modify(&auth_user, &rice)?;

    let mut active: rice::ActiveModel = rice.into();
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        active.slug = Set(crate::utils::slug::slugify(&title));
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A rice with this title already exists".into())
        }
        _ => AppError::from(e),
    })?;

    Ok(Json(UpdateRiceSummary::from(model)))
}

/// Pull a single file field out of a multipart body.
async fn read_single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some(field_name) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::Validation(format!(
        "Missing `{field_name}` file field"
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/dotfiles",
    tag = "Rices",
    operation_id = "replaceDotfiles",
    summary = "Replace the rice's archive",
    responses(
        (status = 200, description = "Archive replaced"),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Not an archive (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn replace_dotfiles(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<StatusCode, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;

    let rice = find_rice(&state.db, id).await?;
    ensure_can_modify(&auth_user, &rice)?;

    let data = read_single_file(multipart, "dotfiles").await?;
    let ext = upload::sniff_archive(&data).ok_or_else(|| {
        AppError::Unprocessable("Unsupported dotfiles type, expected an archive".into())
    })?;

    let dotfiles = rice_dotfiles::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Rice {id} has no dotfiles row")))?;
    let old_path = dotfiles.file_path.clone();

    let new_path = format!("dotfiles/{}.{}", Uuid::new_v4(), ext);
    state.media.put(&new_path, &data).await?;

    let mut active: rice_dotfiles::ActiveModel = dotfiles.into();
    active.file_path = Set(new_path.clone());
    active.file_size = Set(data.len() as i64);
    active.updated_at = Set(chrono::Utc::now());

    if let Err(e) = active.update(&state.db).await {
        cleanup_media(&state, std::slice::from_ref(&new_path)).await;
        return Err(e.into());
    }

    // The old archive is unreferenced now; losing it only wastes disk.
    if let Err(e) = state.media.delete(&old_path).await {
        tracing::warn!("Failed to remove replaced archive {old_path}: {e}");
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/{id}/previews",
    tag = "Rices",
    operation_id = "addPreview",
    summary = "Add a preview image",
    responses(
        (status = 201, description = "Preview added", body = RicePreviewResponse),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Preview limit reached (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Not an image (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn add_preview(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;

    let rice = find_rice(&state.db, id).await?;
    ensure_can_modify(&auth_user, &rice)?;

    let count = rice_preview::Entity::find()
        .filter(rice_preview::Column::RiceId.eq(id))
        .count(&state.db)
        .await?;
    if count >= state.config.storage.max_previews as u64 {
        return Err(AppError::PayloadTooLarge(format!(
            "At most {} preview images are allowed",
            state.config.storage.max_previews
        )));
    }

    let data = read_single_file(multipart, "previews").await?;
    let ext = upload::sniff_image(&data).ok_or_else(|| {
        AppError::Unprocessable("Unsupported preview type, expected an image".into())
    })?;

    let path = format!("previews/{}.{}", Uuid::new_v4(), ext);
    state.media.put(&path, &data).await?;

    let preview = rice_preview::ActiveModel {
        id: Set(Uuid::new_v4()),
        rice_id: Set(id),
        file_path: Set(path.clone()),
        created_at: Set(chrono::Utc::now()),
    };
    let model = match preview.insert(&state.db).await {
        Ok(model) => model,
        Err(e) => {
            cleanup_media(&state, std::slice::from_ref(&path)).await;
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(RicePreviewResponse::from_model(model, &state.config.storage)),
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}/previews/{preview_id}",
    tag = "Rices",
    operation_id = "deletePreview",
    summary = "Remove a preview image",
    description = "A rice always keeps at least one preview; deleting the last one is refused.",
    responses(
        (status = 204, description = "Preview removed"),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown rice or preview (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Last remaining preview (UNPROCESSABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_preview(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, preview_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;

    let rice = find_rice(&state.db, id).await?;
    ensure_can_modify(&auth_user, &rice)?;

    let count = rice_preview::Entity::find()
        .filter(rice_preview::Column::RiceId.eq(id))
        .count(&state.db)
        .await?;
    if count <= 1 {
        return Err(AppError::Unprocessable(
            "A rice must keep at least one preview".into(),
        ));
    }

    let preview = rice_preview::Entity::find_by_id(preview_id)
        .filter(rice_preview::Column::RiceId.eq(id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Preview not found".into()))?;

    let path = preview.file_path.clone();
    preview.delete(&state.db).await?;
    cleanup_media(&state, std::slice::from_ref(&path)).await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/star",
    tag = "Rices",
    operation_id = "starRice",
    summary = "Star a rice",
    description = "Idempotent; starring an already-starred rice succeeds.",
    responses(
        (status = 201, description = "Starred"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn star_rice(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    find_rice(&state.db, id).await?;

    let star = rice_star::ActiveModel {
        rice_id: Set(id),
        user_id: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
    };

    let result = rice_star::Entity::insert(star)
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                rice_star::Column::RiceId,
                rice_star::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(StatusCode::CREATED),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    delete,
    path = "/{id}/star",
    tag = "Rices",
    operation_id = "unstarRice",
    summary = "Remove a star",
    description = "Succeeds whether or not a star existed.",
    responses(
        (status = 204, description = "Star removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn unstar_rice(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    rice_star::Entity::delete_many()
        .filter(rice_star::Column::RiceId.eq(id))
        .filter(rice_star::Column::UserId.eq(auth_user.user_id))
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Rices",
    operation_id = "deleteRice",
    summary = "Delete a rice and its dependents",
    responses(
        (status = 204, description = "Rice deleted"),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown rice (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_rice(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let rice = find_rice(&state.db, id).await?;
    ensure_can_modify(&auth_user, &rice)?;

    purge_rice(&state, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a rice with all dependent rows, then its media files.
/// Also used when an account is deleted.
pub(crate) async fn purge_rice(state: &AppState, id: Uuid) -> Result<(), AppError> {
    let previews = rice_preview::Entity::find()
        .filter(rice_preview::Column::RiceId.eq(id))
        .all(&state.db)
        .await?;
    let dotfiles = rice_dotfiles::Entity::find_by_id(id).one(&state.db).await?;

    let txn = state.db.begin().await?;
    rice_star::Entity::delete_many()
        .filter(rice_star::Column::RiceId.eq(id))
        .exec(&txn)
        .await?;
    rice_comment::Entity::delete_many()
        .filter(rice_comment::Column::RiceId.eq(id))
        .exec(&txn)
        .await?;
    report::Entity::delete_many()
        .filter(report::Column::RiceId.eq(id))
        .exec(&txn)
        .await?;
    rice_preview::Entity::delete_many()
        .filter(rice_preview::Column::RiceId.eq(id))
        .exec(&txn)
        .await?;
    rice_dotfiles::Entity::delete_many()
        .filter(rice_dotfiles::Column::RiceId.eq(id))
        .exec(&txn)
        .await?;
    rice::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    let mut paths: Vec<String> = previews.into_iter().map(|p| p.file_path).collect();
    if let Some(df) = dotfiles {
        paths.push(df.file_path);
    }
    cleanup_media(state, &paths).await;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/{id}/rices/{slug}",
    tag = "Users",
    operation_id = "getRiceBySlug",
    summary = "Full rice detail by author username and slug",
    responses(
        (status = 200, description = "Rice with relations", body = RiceResponse),
        (status = 404, description = "Unknown user or slug (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer))]
pub async fn get_rice_by_slug(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path((username, slug)): Path<(String, String)>,
) -> Result<Json<RiceResponse>, AppError> {
    let author = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let rice = rice::Entity::find()
        .filter(rice::Column::AuthorId.eq(author.id))
        .filter(rice::Column::Slug.eq(&slug))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rice not found".into()))?;

    Ok(Json(rice_detail(&state, rice, viewer).await?))
}
