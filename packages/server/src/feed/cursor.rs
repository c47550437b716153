use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

/// Timestamp format accepted in the `lastCreatedAt` query parameter,
/// e.g. `2025-06-01T12:30:00.000000+00:00`. Microsecond precision with
/// an explicit numeric offset; `Z` is not accepted.
pub const CURSOR_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// Pagination cursor for the rice feed.
///
/// Clients do not receive an opaque cursor; they resubmit fields of the
/// last row they saw (`lastId`, `lastCreatedAt`, `lastDownloads`) as
/// plain query parameters. The three fields are independent: a request
/// is a `FirstPage` only when all of them are absent, and a partial set
/// is passed through as given. Which fields a sort mode actually reads
/// is decided by the query builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCursor {
    FirstPage,
    Continuation {
        last_id: Option<Uuid>,
        last_created_at: Option<DateTime<Utc>>,
        last_downloads: Option<i64>,
    },
}

impl FeedCursor {
    /// Decode the raw query parameter values. Empty strings count as
    /// absent. Fails on the first unparsable field.
    pub fn parse(
        last_id: Option<&str>,
        last_created_at: Option<&str>,
        last_downloads: Option<&str>,
    ) -> Result<Self, AppError> {
        let last_id = last_id.filter(|s| !s.is_empty());
        let last_created_at = last_created_at.filter(|s| !s.is_empty());
        let last_downloads = last_downloads.filter(|s| !s.is_empty());

        if last_id.is_none() && last_created_at.is_none() && last_downloads.is_none() {
            return Ok(FeedCursor::FirstPage);
        }

        let last_id = last_id
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| AppError::Validation("Failed to parse lastId".into()))?;

        let last_created_at = last_created_at.map(parse_cursor_timestamp).transpose()?;

        let last_downloads = last_downloads
            .map(str::parse::<i64>)
            .transpose()
            .map_err(|_| AppError::Validation("Failed to parse lastDownloads".into()))?;

        Ok(FeedCursor::Continuation {
            last_id,
            last_created_at,
            last_downloads,
        })
    }
}

/// chrono's `%.6f` treats the fraction as optional, but the cursor
/// format is fixed-width, so the six digits are checked up front.
fn parse_cursor_timestamp(s: &str) -> Result<DateTime<Utc>, AppError> {
    let invalid = || AppError::Validation("Failed to parse lastCreatedAt".into());

    let (_, frac) = s.split_once('.').ok_or_else(invalid)?;
    if frac.len() < 6 || !frac.as_bytes()[..6].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    DateTime::parse_from_str(s, CURSOR_TIMESTAMP_FORMAT)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| invalid())
}
