//! SQLite-backed persistent store.
//!
//! Split into focused submodules:
//! - `settings`: key/value runtime settings
//! - `messages`: append-only inbound message log
//! - `schedules`: broadcast schedule CRUD
//! - `convo`: bounded rolling conversation window per chat
//!
//! Every operation runs as its own statement (or transaction) on the pool,
//! so the listener, the scheduler, and the control panel can all use one
//! `Store` concurrently without further coordination.

mod convo;
mod messages;
mod schedules;
mod settings;

pub use messages::LoggedMessage;
pub use schedules::Schedule;

use lantern_core::{config::MemoryConfig, config::shellexpand, error::LanternError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

const IN_MEMORY: &str = ":memory:";

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    db_path: String,
}

impl Store {
    /// Create a new store, running migrations on first use.
    pub async fn new(config: &MemoryConfig) -> Result<Self, LanternError> {
        if config.db_path == IN_MEMORY {
            return Self::in_memory().await;
        }

        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LanternError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| LanternError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| LanternError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self { pool, db_path })
    }

    /// Open a private in-memory database.
    ///
    /// Each SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self, LanternError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| LanternError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| LanternError::Memory(format!("failed to open in-memory sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            db_path: IN_MEMORY.to_string(),
        })
    }

    /// Resolved database path (or `:memory:`).
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Close the pool, waiting for checked-out connections to return.
    ///
    /// Every later operation fails with a `Memory` error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), LanternError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| LanternError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            ("002_convo", include_str!("../../migrations/002_convo.sql")),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        LanternError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| LanternError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    LanternError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}
