use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Backend holding the retention rules, selected with `type = "..."`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DatabaseConfig {
    /// Only the health endpoints are served.
    #[default]
    None,

    #[cfg(feature = "database-sqlite")]
    Sqlite(SqliteConfig),

    #[cfg(feature = "database-postgres")]
    Postgres(PostgresConfig),
}

impl DatabaseConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, DatabaseConfig::None)
    }

    /// Whether `serve` applies pending migrations before listening.
    pub fn migrate_on_start(&self) -> bool {
        match self {
            DatabaseConfig::None => false,
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.migrate_on_start,
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(c) => c.migrate_on_start,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::None => Ok(()),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.validate(),
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(c) => c.validate(),
        }
    }
}

#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path of the database file.
    pub path: String,

    #[serde(default = "enabled")]
    pub create_if_missing: bool,

    #[serde(default)]
    pub journal_mode: SqliteJournal,

    /// How long a writer waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_sqlite_pool_size")]
    pub pool_size: u32,

    #[serde(default = "enabled")]
    pub migrate_on_start: bool,
}

#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournal {
    #[default]
    Wal,
    Delete,
}

#[cfg(feature = "database-sqlite")]
impl SqliteConfig {
    pub fn connect_options(&self) -> sqlx::sqlite::SqliteConnectOptions {
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .journal_mode(match self.journal_mode {
                SqliteJournal::Wal => SqliteJournalMode::Wal,
                SqliteJournal::Delete => SqliteJournalMode::Delete,
            })
            .busy_timeout(std::time::Duration::from_millis(self.busy_timeout_ms))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::Validation("database.path is empty".into()));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Validation("database.pool_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(feature = "database-postgres")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresConfig {
    /// Primary server. Writes, soft deletes and migrations always go here.
    pub url: String,

    /// Optional replica serving the finders.
    #[serde(default)]
    pub replica_url: Option<String>,

    /// libpq-style `sslmode` (`disable`, `prefer`, `require`, `verify-ca`,
    /// `verify-full`). Unset keeps whatever the URL says.
    #[serde(default)]
    pub ssl_mode: Option<String>,

    /// Sizing applied to the primary and the replica pool alike.
    #[serde(default)]
    pub pool: PgPoolSizing,

    #[serde(default = "enabled")]
    pub migrate_on_start: bool,
}

#[cfg(feature = "database-postgres")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PgPoolSizing {
    #[serde(default = "default_pg_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_pg_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_pg_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_pg_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

#[cfg(feature = "database-postgres")]
impl Default for PgPoolSizing {
    fn default() -> Self {
        Self {
            min_connections: default_pg_min_connections(),
            max_connections: default_pg_max_connections(),
            acquire_timeout_secs: default_pg_acquire_timeout_secs(),
            idle_timeout_secs: default_pg_idle_timeout_secs(),
        }
    }
}

#[cfg(feature = "database-postgres")]
impl PgPoolSizing {
    pub fn pool_options(&self) -> sqlx::postgres::PgPoolOptions {
        use std::time::Duration;

        sqlx::postgres::PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

#[cfg(feature = "database-postgres")]
impl PostgresConfig {
    /// Connection options for `url` (the primary or the replica) with the
    /// configured SSL mode applied.
    pub fn connect_options(
        &self,
        url: &str,
    ) -> Result<sqlx::postgres::PgConnectOptions, sqlx::Error> {
        let options: sqlx::postgres::PgConnectOptions = url.parse()?;
        Ok(match &self.ssl_mode {
            Some(mode) => options.ssl_mode(mode.parse()?),
            None => options,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Validation("database.url is empty".into()));
        }
        let (min, max) = (self.pool.min_connections, self.pool.max_connections);
        if max == 0 || min > max {
            return Err(ConfigError::Validation(format!(
                "database.pool.max_connections must be at least 1 and not below \
                 min_connections, got min {min} max {max}"
            )));
        }
        if let Some(mode) = &self.ssl_mode
            && mode.parse::<sqlx::postgres::PgSslMode>().is_err()
        {
            return Err(ConfigError::Validation(format!(
                "database.ssl_mode '{mode}' is not a libpq sslmode"
            )));
        }
        Ok(())
    }
}

#[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
fn enabled() -> bool {
    true
}

#[cfg(feature = "database-sqlite")]
fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[cfg(feature = "database-sqlite")]
fn default_sqlite_pool_size() -> u32 {
    4
}

#[cfg(feature = "database-postgres")]
fn default_pg_min_connections() -> u32 {
    1
}

#[cfg(feature = "database-postgres")]
fn default_pg_max_connections() -> u32 {
    10
}

#[cfg(feature = "database-postgres")]
fn default_pg_acquire_timeout_secs() -> u64 {
    10
}

#[cfg(feature = "database-postgres")]
fn default_pg_idle_timeout_secs() -> u64 {
    300
}
