use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::DateTimeUtc;
use sea_orm::{DbBackend, FromQueryResult, Statement, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::feed::cursor::FeedCursor;

/// Fixed page size of the rice feed. Not client-configurable.
pub const PAGE_SIZE: u32 = 20;

/// The supported feed orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Trending,
    Recent,
    MostDownloads,
    MostStars,
}

impl SortMode {
    /// Parse the `sort` query parameter. Absent defaults to trending;
    /// any unknown value (including the empty string) is rejected
    /// before cursor parsing or query construction.
    pub fn from_query(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None => Ok(Self::Trending),
            Some("trending") => Ok(Self::Trending),
            Some("recent") => Ok(Self::Recent),
            Some("mostDownloads") => Ok(Self::MostDownloads),
            Some("mostStars") => Ok(Self::MostStars),
            Some(_) => Err(AppError::Validation(
                "Unsupported sorting method requested".into(),
            )),
        }
    }
}

/// One row of the feed projection. Field names must match the column
/// aliases selected by [`build_feed_statement`]; `feed_columns_match_row_struct`
/// below checks the two against each other.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PartialRiceRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub created_at: DateTimeUtc,
    pub display_name: String,
    pub username: String,
    pub thumbnail: String,
    pub star_count: i64,
    pub download_count: i64,
    pub is_starred: bool,
}

const BASE_SELECT: &str = "\
SELECT
    r.id, r.title, r.slug, r.created_at,
    u.display_name, u.username,
    p.file_path AS thumbnail,
    count(DISTINCT s.user_id) AS star_count,
    df.download_count";

const BASE_JOINS: &str = "
FROM rices r
JOIN users u ON u.id = r.author_id
LEFT JOIN rice_stars s ON s.rice_id = r.id
JOIN rice_dotfiles df ON df.rice_id = r.id
JOIN LATERAL (
    SELECT p.file_path
    FROM rice_previews p
    WHERE p.rice_id = r.id
    ORDER BY p.created_at
    LIMIT 1
) p ON TRUE
";

const GROUP_BY: &str = "
GROUP BY r.id, r.slug, r.title, r.created_at, df.download_count, u.display_name, u.username, p.file_path
";

/// Far-future `created_at` sentinel used on the first page of the
/// recent feed, where the keyset predicate is always present.
fn far_future() -> DateTime<Utc> {
    Utc::now() + Duration::days(365 * 999)
}

/// Build the feed query for one page.
///
/// The viewer id, when present, is always bound as `$1` (it feeds the
/// `is_starred` EXISTS subquery) and shifts the cursor parameters up by
/// one. The keyset predicates mirror each mode's ORDER BY:
///
/// - trending and mostStars order by a live-computed score that cannot
///   be resubmitted by clients, so their cursor is the id of the last
///   row only (`r.id < lastId`). A page boundary can skip or repeat a
///   row when counts change between fetches; that approximation is
///   accepted, not a bug to fix.
/// - recent compares `(created_at, id)` and keeps the predicate on
///   every page, binding the far-future sentinel and a NULL id for the
///   first one.
/// - mostDownloads compares `(download_count, id)`, skipping the
///   predicate only when `last_downloads` is the first-page sentinel -1.
///
/// A continuation with some fields missing binds their zero values
/// (NULL id, year-zero timestamp, 0 downloads); callers are expected to
/// resubmit exactly the fields of the last row they received.
pub fn build_feed_statement(
    mode: SortMode,
    cursor: &FeedCursor,
    viewer: Option<Uuid>,
) -> Statement {
    let mut sql = String::from(BASE_SELECT);
    let mut values: Vec<Value> = Vec::new();

    match viewer {
        Some(viewer_id) => {
            values.push(viewer_id.into());
            sql.push_str(
                ",
    EXISTS (
        SELECT 1
        FROM rice_stars rs
        WHERE rs.rice_id = r.id AND rs.user_id = $1
    ) AS is_starred",
            );
        }
        None => sql.push_str(",
    false AS is_starred"),
    }

    sql.push_str(BASE_JOINS);

    let (last_id, last_created_at, last_downloads) = match cursor {
        FeedCursor::FirstPage => (None, far_future(), -1i64),
        FeedCursor::Continuation {
            last_id,
            last_created_at,
            last_downloads,
        } => (
            *last_id,
            last_created_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
            last_downloads.unwrap_or(0),
        ),
    };

    let next = values.len() + 1;
    let order = match mode {
        SortMode::Trending => {
            if let Some(id) = last_id {
                sql.push_str(&format!("WHERE r.id < ${next}"));
                values.push(id.into());
            }
            "ORDER BY (df.download_count + count(DISTINCT s.user_id)) / pow(extract(EPOCH FROM (current_timestamp - r.created_at)) / 3600 + 2, 1.5) DESC, r.id DESC"
        }
        SortMode::Recent => {
            sql.push_str(&format!(
                "WHERE (r.created_at, r.id) < (${next}, ${})",
                next + 1
            ));
            values.push(last_created_at.into());
            values.push(Value::Uuid(last_id));
            "ORDER BY r.created_at DESC, r.id DESC"
        }
        SortMode::MostDownloads => {
            if last_downloads != -1 {
                sql.push_str(&format!(
                    "WHERE (df.download_count, r.id) < (${next}, ${})",
                    next + 1
                ));
                values.push(last_downloads.into());
                values.push(Value::Uuid(last_id));
            }
            "ORDER BY download_count DESC, r.id DESC"
        }
        SortMode::MostStars => {
            if let Some(id) = last_id {
                sql.push_str(&format!("WHERE r.id < ${next}"));
                values.push(id.into());
            }
            "ORDER BY star_count DESC, r.id DESC"
        }
    };

    sql.push_str(GROUP_BY);
    sql.push_str(order);
    sql.push_str(&format!(" LIMIT {PAGE_SIZE}"));

    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

/// All of one author's rices, newest first, in the feed projection.
/// Profile pages are small enough that this is not paginated.
pub fn build_user_rices_statement(author: Uuid, viewer: Option<Uuid>) -> Statement {
    let mut sql = String::from(BASE_SELECT);
    let mut values: Vec<Value> = Vec::new();

    match viewer {
        Some(viewer_id) => {
            values.push(viewer_id.into());
            sql.push_str(
                ",
    EXISTS (
        SELECT 1
        FROM rice_stars rs
        WHERE rs.rice_id = r.id AND rs.user_id = $1
    ) AS is_starred",
            );
        }
        None => sql.push_str(",
    false AS is_starred"),
    }

    sql.push_str(BASE_JOINS);
    sql.push_str(&format!("WHERE u.id = ${}", values.len() + 1));
    values.push(author.into());

    sql.push_str(GROUP_BY);
    sql.push_str("ORDER BY r.created_at DESC, r.id DESC");

    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}
