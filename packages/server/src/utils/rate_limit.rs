use std::cmp;

use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{report, rice_comment};
use crate::error::AppError;

/// Check the per-user write rate limit for comments and reports.
///
/// Uses an optimistic (non-locking) count over the last minute, so
/// concurrent requests within a very short window may both pass the
/// check before either insert completes. That is an accepted trade-off
/// compared to locking, which would add latency to every write.
pub async fn check_write_rate_limit(
    db: &DatabaseConnection,
    user_id: Uuid,
    limit_per_minute: u32,
) -> Result<(), AppError> {
    if limit_per_minute == 0 {
        return Ok(()); // Rate limiting disabled
    }

    let one_minute_ago = Utc::now() - Duration::minutes(1);

    let comments = rice_comment::Entity::find()
        .filter(rice_comment::Column::AuthorId.eq(user_id))
        .filter(rice_comment::Column::CreatedAt.gt(one_minute_ago))
        .count(db)
        .await?;

    let reports = report::Entity::find()
        .filter(report::Column::ReporterId.eq(user_id))
        .filter(report::Column::CreatedAt.gt(one_minute_ago))
        .count(db)
        .await?;

    if comments + reports >= limit_per_minute as u64 {
        let oldest_comment = rice_comment::Entity::find()
            .filter(rice_comment::Column::AuthorId.eq(user_id))
            .filter(rice_comment::Column::CreatedAt.gt(one_minute_ago))
            .order_by_asc(rice_comment::Column::CreatedAt)
            .one(db)
            .await?
            .map(|c| c.created_at);

        let oldest_report = report::Entity::find()
            .filter(report::Column::ReporterId.eq(user_id))
            .filter(report::Column::CreatedAt.gt(one_minute_ago))
            .order_by_asc(report::Column::CreatedAt)
            .one(db)
            .await?
            .map(|r| r.created_at);

        let oldest: Option<DateTime<Utc>> = match (oldest_comment, oldest_report) {
            (Some(a), Some(b)) => Some(cmp::min(a, b)),
            (a, b) => a.or(b),
        };

        let retry_after = oldest
            .map(|t| {
                let expires = t + Duration::minutes(1);
                cmp::max((expires - Utc::now()).num_seconds(), 1) as u64
            })
            .unwrap_or(60);

        return Err(AppError::RateLimited { retry_after });
    }

    Ok(())
}
