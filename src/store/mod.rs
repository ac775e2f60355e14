//! SQLite-backed stores for conversation history, style profiles, and notes.
//!
//! # SQLite write pattern
//!
//! All tables use direct pool writes. This is acceptable because writes are
//! low-frequency (one incoming and one outgoing message per invocation),
//! different invocations touch different counterpart rows, and WAL mode
//! handles the remaining concurrency. The reply engine itself only reads —
//! it sees these stores through the [`crate::engine::context::HistoryStore`]
//! and [`crate::engine::context::StyleStore`] traits.

pub mod history;
pub mod profile;

use std::path::Path;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Errors from the store subsystem.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Open (or create) the construct database and apply the schema migration.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migration fails.
pub async fn open(path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .pragma("trusted_schema", "OFF")
        .pragma("foreign_keys", "ON");

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    let migration_sql = include_str!("../../migrations/001_construct_schema.sql");
    sqlx::raw_sql(migration_sql)
        .execute(&pool)
        .await
        .context("failed to apply construct schema migration")?;

    Ok(pool)
}

/// Open an in-memory database for tests.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or migration fails.
#[doc(hidden)]
pub async fn open_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new().in_memory(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("failed to open in-memory database")?;

    let migration_sql = include_str!("../../migrations/001_construct_schema.sql");
    sqlx::raw_sql(migration_sql)
        .execute(&pool)
        .await
        .context("failed to apply construct schema migration")?;

    Ok(pool)
}
