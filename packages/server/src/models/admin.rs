use sea_orm::FromQueryResult;
use serde::Serialize;

/// Row shape for the service statistics query; all counts are computed
/// in a single statement.
#[derive(Debug, FromQueryResult)]
pub struct ServiceStatsRow {
    pub user_count: i64,
    pub rice_count: i64,
    pub comment_count: i64,
    pub report_count: i64,
    pub open_report_count: i64,
    pub users_last_day: i64,
    pub rices_last_day: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatsResponse {
    pub user_count: i64,
    pub rice_count: i64,
    pub comment_count: i64,
    pub report_count: i64,
    pub open_report_count: i64,
    pub users_last_day: i64,
    pub rices_last_day: i64,
}

impl From<ServiceStatsRow> for ServiceStatsResponse {
    fn from(row: ServiceStatsRow) -> Self {
        Self {
            user_count: row.user_count,
            rice_count: row.rice_count,
            comment_count: row.comment_count,
            report_count: row.report_count,
            open_report_count: row.open_report_count,
            users_last_day: row.users_last_day,
            rices_last_day: row.rices_last_day,
        }
    }
}
