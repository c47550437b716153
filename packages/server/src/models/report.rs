use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[schema(example = "Preview images contain spam watermarks")]
    pub reason: String,
    pub rice_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

pub fn validate_create_report(payload: &CreateReportRequest) -> Result<(), AppError> {
    let len = payload.reason.chars().count();
    if len < 8 || len > 1024 {
        return Err(AppError::Validation(
            "Report reason must be 8-1024 characters".into(),
        ));
    }
    match (payload.rice_id, payload.comment_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(AppError::Validation(
            "Exactly one of riceId or commentId is required".into(),
        )),
    }
}

/// Row shape for report listings joined with the reporter.
#[derive(Debug, FromQueryResult)]
pub struct ReportWithUserRow {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub display_name: String,
    pub username: String,
    pub reason: String,
    pub rice_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub display_name: String,
    pub username: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rice_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<Uuid>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ReportWithUserRow> for ReportResponse {
    fn from(row: ReportWithUserRow) -> Self {
        Self {
            id: row.id,
            reporter_id: row.reporter_id,
            display_name: row.display_name,
            username: row.username,
            reason: row.reason,
            rice_id: row.rice_id,
            comment_id: row.comment_id,
            is_closed: row.is_closed,
            created_at: row.created_at,
        }
    }
}
