mod error;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

enum Backend {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres {
        primary: sqlx::PgPool,
        replica: Option<sqlx::PgPool>,
    },
    #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
    _Unavailable(std::convert::Infallible),
}

/// Connection pool for the retention rule store.
///
/// The repository is built once and shared by every handler.
pub struct DbPool {
    backend: Backend,
    retention_rules: Arc<dyn RetentionRuleRepo>,
}

impl DbPool {
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        DbPool {
            retention_rules: Arc::new(sqlite::SqliteRetentionRuleRepo::new(pool.clone())),
            backend: Backend::Sqlite(pool),
        }
    }

    /// Finders go to `replica` when one is given.
    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(primary: sqlx::PgPool, replica: Option<sqlx::PgPool>) -> Self {
        DbPool {
            retention_rules: Arc::new(postgres::PostgresRetentionRuleRepo::new(
                primary.clone(),
                replica.clone(),
            )),
            backend: Backend::Postgres { primary, replica },
        }
    }

    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.pool_size)
                    .connect_with(cfg.connect_options())
                    .await?;
                tracing::info!(path = %cfg.path, "Opened SQLite rule store");
                Ok(Self::from_sqlite(pool))
            }
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => {
                let primary = cfg
                    .pool
                    .pool_options()
                    .connect_with(cfg.connect_options(&cfg.url)?)
                    .await?;
                let replica = match &cfg.replica_url {
                    Some(url) => {
                        tracing::info!("Routing retention rule reads to the replica");
                        let options = cfg.connect_options(url)?;
                        Some(cfg.pool.pool_options().connect_with(options).await?)
                    }
                    None => None,
                };
                Ok(Self::from_postgres(primary, replica))
            }
        }
    }

    /// Apply pending schema migrations. Postgres migrations run on the primary.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.backend {
            #[cfg(feature = "database-sqlite")]
            Backend::Sqlite(pool) => {
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite schema is up to date");
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            Backend::Postgres { primary, .. } => {
                sqlx::migrate!("./migrations_sqlx/postgres")
                    .run(primary)
                    .await?;
                tracing::info!("PostgreSQL schema is up to date");
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            Backend::_Unavailable(never) => match *never {},
        }
    }

    pub fn retention_rules(&self) -> Arc<dyn RetentionRuleRepo> {
        Arc::clone(&self.retention_rules)
    }

    /// Round-trip a trivial query on every pool, replica included.
    pub async fn ping(&self) -> DbResult<()> {
        match &self.backend {
            #[cfg(feature = "database-sqlite")]
            Backend::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            Backend::Postgres { primary, replica } => {
                sqlx::query("SELECT 1").execute(primary).await?;
                if let Some(replica) = replica {
                    sqlx::query("SELECT 1").execute(replica).await?;
                }
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            Backend::_Unavailable(never) => match *never {},
        }
    }
}
