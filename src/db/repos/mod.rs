mod retention_rules;

pub use retention_rules::*;

use super::error::{DbError, DbResult};

/// Row limit for single-record finders: one row to return, one more to detect ambiguity.
pub(crate) const SINGLE_RECORD_FETCH_LIMIT: i64 = 2;

/// Collapse the rows of a single-record query.
///
/// No rows is `Ok(None)`; more than one row is [`DbError::NonUnique`].
pub(crate) fn single_record<T>(mut rows: Vec<T>) -> DbResult<Option<T>> {
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        _ => Err(DbError::NonUnique),
    }
}
