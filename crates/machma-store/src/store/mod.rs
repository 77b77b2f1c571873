//! SQLite-backed exercise and rep store.
//!
//! Split into focused submodules:
//! - `entities`: row types for the four tables
//! - `scope`: per-command transaction scope
//! - `guc`: get / update-or-create helper
//! - `aggregate`: max, per-user, and todo rep queries
//! - `users`, `exercises`, `reps`: domain operations on a [`Scope`]
//! - `seed`: demo data for ethereal databases

pub mod aggregate;
pub mod entities;
mod exercises;
pub mod guc;
mod reps;
pub mod scope;
mod seed;
mod users;

use machma_core::{
    config::{shellexpand, StoreConfig},
    error::MachmaError,
};
use scope::Scope;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, warn};

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub users: i64,
    pub exercises: i64,
    pub aliases: i64,
    pub rep_rows: i64,
}

impl Store {
    /// Open the store, creating the database and its tables if missing.
    pub async fn new(config: &StoreConfig) -> Result<Self, MachmaError> {
        let pool = if config.is_in_memory() {
            Self::connect_in_memory().await?
        } else {
            let db_path = shellexpand(&config.db_path);

            // Ensure parent directory exists.
            if let Some(parent) = std::path::Path::new(&db_path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MachmaError::Store(format!("failed to create data dir: {e}")))?;
            }

            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
                .map_err(|e| MachmaError::Store(format!("invalid db path: {e}")))?
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal);

            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(opts)
                .await
                .map_err(|e| MachmaError::Store(format!("failed to connect to sqlite: {e}")))?;
            info!("Store initialized at {db_path}");
            pool
        };

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// A single-connection pool over a private in-memory database.
    ///
    /// The connection must never be recycled: closing it drops the data.
    async fn connect_in_memory() -> Result<SqlitePool, MachmaError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| MachmaError::Store(format!("invalid db path: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| MachmaError::Store(format!("failed to open in-memory sqlite: {e}")))?;
        info!("Store initialized in memory");
        Ok(pool)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction scope. Dropping it without committing rolls back.
    pub async fn begin(&self) -> Result<Scope, MachmaError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MachmaError::Store(format!("failed to begin transaction: {e}")))?;
        Ok(Scope::new(tx))
    }

    /// Run `f` inside a fresh transaction scope.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`.
    pub async fn scoped<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: AsyncFnOnce(&mut Scope) -> Result<T, E>,
        E: From<MachmaError>,
    {
        let mut scope = self.begin().await?;
        match f(&mut scope).await {
            Ok(value) => {
                scope.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = scope.rollback().await {
                    warn!("rollback failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    /// Count the rows of every table.
    pub async fn stats(&self) -> Result<StoreStats, MachmaError> {
        let (users, exercises, aliases, rep_rows): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
               (SELECT COUNT(*) FROM users), \
               (SELECT COUNT(*) FROM exercises), \
               (SELECT COUNT(*) FROM exercise_aliases), \
               (SELECT COUNT(*) FROM user_reps)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MachmaError::Store(format!("stats query failed: {e}")))?;

        Ok(StoreStats {
            users,
            exercises,
            aliases,
            rep_rows,
        })
    }

    /// Create missing tables, tracking which migrations have been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), MachmaError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| MachmaError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        MachmaError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| MachmaError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    MachmaError::Store(format!("failed to record migration {name}: {e}"))
                })?;

            info!("applied migration {name}");
        }
        Ok(())
    }
}
