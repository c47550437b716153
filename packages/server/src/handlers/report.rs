use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{report, rice, rice_comment};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::report::{
    CreateReportRequest, ReportResponse, ReportWithUserRow, validate_create_report,
};
use crate::state::AppState;
use crate::utils::{ban, rate_limit};

const REPORT_WITH_USER: &str = "\
SELECT rp.id, rp.reporter_id, u.display_name, u.username, rp.reason,
       rp.rice_id, rp.comment_id, rp.is_closed, rp.created_at
FROM reports rp
JOIN users u ON u.id = rp.reporter_id";

#[utoipa::path(
    post,
    path = "/",
    tag = "Reports",
    operation_id = "createReport",
    summary = "Report a rice or a comment",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Banned (USER_BANNED)", body = ErrorBody),
        (status = 404, description = "Unknown target (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reported by you (CONFLICT)", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    ban::ensure_not_banned(&state.db, auth_user.user_id).await?;
    rate_limit::check_write_rate_limit(
        &state.db,
        auth_user.user_id,
        state.config.moderation.writes_per_minute,
    )
    .await?;

    validate_create_report(&payload)?;

    let target_exists = match (payload.rice_id, payload.comment_id) {
        (Some(rice_id), None) => rice::Entity::find_by_id(rice_id)
            .one(&state.db)
            .await?
            .is_some(),
        (None, Some(comment_id)) => rice_comment::Entity::find_by_id(comment_id)
            .one(&state.db)
            .await?
            .is_some(),
        _ => unreachable!("validated above"),
    };
    if !target_exists {
        return Err(AppError::NotFound("Reported target not found".into()));
    }

    let mut duplicate = report::Entity::find()
        .filter(report::Column::ReporterId.eq(auth_user.user_id))
        .filter(report::Column::IsClosed.eq(false));
    duplicate = match (payload.rice_id, payload.comment_id) {
        (Some(rice_id), _) => duplicate.filter(report::Column::RiceId.eq(rice_id)),
        (_, Some(comment_id)) => duplicate.filter(report::Column::CommentId.eq(comment_id)),
        _ => duplicate,
    };
    if duplicate.one(&state.db).await?.is_some() {
        return Err(AppError::Conflict(
            "You already have an open report for this target".into(),
        ));
    }

    report::ActiveModel {
        id: Set(Uuid::new_v4()),
        reporter_id: Set(auth_user.user_id),
        rice_id: Set(payload.rice_id),
        comment_id: Set(payload.comment_id),
        reason: Set(payload.reason.trim().to_string()),
        is_closed: Set(false),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&state.db)
    .await?;

    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Reports",
    operation_id = "listReports",
    summary = "All reports, open first, newest first",
    responses(
        (status = 200, description = "Reports with reporter info", body = [ReportResponse]),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_reports(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportResponse>>, AppError> {
    auth_user.require_admin()?;

    let stmt = Statement::from_string(
        DbBackend::Postgres,
        format!("{REPORT_WITH_USER}\nORDER BY rp.is_closed ASC, rp.created_at DESC"),
    );
    let rows = ReportWithUserRow::find_by_statement(stmt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(ReportResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Reports",
    operation_id = "getReport",
    summary = "One report",
    responses(
        (status = 200, description = "The report", body = ReportResponse),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown report (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    auth_user.require_admin()?;

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        format!("{REPORT_WITH_USER}\nWHERE rp.id = $1"),
        [id.into()],
    );
    let row = ReportWithUserRow::find_by_statement(stmt)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".into()))?;

    Ok(Json(ReportResponse::from(row)))
}

#[utoipa::path(
    post,
    path = "/{id}/close",
    tag = "Reports",
    operation_id = "closeReport",
    summary = "Close a report",
    description = "Closing an already-closed report succeeds without change.",
    responses(
        (status = 200, description = "Report closed"),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown report (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn close_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let report = report::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".into()))?;

    if !report.is_closed {
        let mut active: report::ActiveModel = report.into();
        active.is_closed = Set(true);
        active.update(&state.db).await?;
    }

    Ok(StatusCode::OK)
}
