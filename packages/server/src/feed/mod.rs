//! Feed ranking and keyset pagination for `GET /rices`.
//!
//! The flow is: parse the sort mode, decode the cursor fields, resolve
//! the viewer, then build one parameterized SQL statement per page.
//! Cursor decoding happens before any database access; a malformed
//! field fails the whole request with a validation error.

pub mod cursor;
pub mod query;

pub use cursor::FeedCursor;
pub use query::{
    PAGE_SIZE, PartialRiceRow, SortMode, build_feed_statement, build_user_rices_statement,
};
