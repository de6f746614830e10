use thiserror::Error;

/// Failures surfaced by the retention rule store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no database is configured")]
    NotConfigured,

    #[error("retention rule not found")]
    NotFound,

    /// An active rule already holds the business key.
    #[error("duplicate active rule: {0}")]
    Conflict(String),

    #[error("expected at most one retention rule, found several")]
    NonUnique,

    #[error("invalid input: {0}")]
    Validation(String),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;
