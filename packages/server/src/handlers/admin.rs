use axum::extract::State;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::admin::{ServiceStatsResponse, ServiceStatsRow};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "getStats",
    summary = "Service-wide counts",
    description = "All counts are computed in a single statement so they are \
                   consistent with each other.",
    responses(
        (status = 200, description = "Service statistics", body = ServiceStatsResponse),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ServiceStatsResponse>, AppError> {
    auth_user.require_admin()?;

    let stmt = Statement::from_string(
        DbBackend::Postgres,
        "SELECT
            (SELECT count(*) FROM users) AS user_count,
            (SELECT count(*) FROM rices) AS rice_count,
            (SELECT count(*) FROM rice_comments) AS comment_count,
            (SELECT count(*) FROM reports) AS report_count,
            (SELECT count(*) FROM reports WHERE NOT is_closed) AS open_report_count,
            (SELECT count(*) FROM users WHERE created_at > now() - interval '1 day') AS users_last_day,
            (SELECT count(*) FROM rices WHERE created_at > now() - interval '1 day') AS rices_last_day",
    );

    let row = ServiceStatsRow::find_by_statement(stmt)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Stats query returned no row".into()))?;

    Ok(Json(ServiceStatsResponse::from(row)))
}
