//! Style profile and Q&A notes store.
//!
//! Profiles are produced by a separate offline pipeline; this store only
//! holds and serves the documents. Notes are free-text relationship facts
//! the subject typed in themselves.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::trace;

use crate::engine::context::StyleStore;

use super::StoreError;

/// SQLite-backed style documents and notes, keyed by counterpart.
#[derive(Clone)]
pub struct SqliteStyleStore {
    pool: SqlitePool,
}

impl SqliteStyleStore {
    /// Create a store over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the style document for a counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn set_profile(&self, counterpart_id: &str, document: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO style_profiles (counterpart_id, document, updated_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(counterpart_id) DO UPDATE SET \
               document = ?2, updated_at = datetime('now')",
        )
        .bind(counterpart_id)
        .bind(document)
        .execute(&self.pool)
        .await?;

        trace!(counterpart_id, "style profile stored");
        Ok(())
    }

    /// Fetch the style document for a counterpart, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn fetch_profile(&self, counterpart_id: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT document FROM style_profiles WHERE counterpart_id = ?1")
                .bind(counterpart_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(document,)| document))
    }

    /// Insert or replace the Q&A notes for a counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn set_notes(&self, counterpart_id: &str, notes: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO qa_notes (counterpart_id, notes, updated_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(counterpart_id) DO UPDATE SET \
               notes = ?2, updated_at = datetime('now')",
        )
        .bind(counterpart_id)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        trace!(counterpart_id, "qa notes stored");
        Ok(())
    }

    /// Fetch the Q&A notes for a counterpart, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn fetch_notes(&self, counterpart_id: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT notes FROM qa_notes WHERE counterpart_id = ?1")
                .bind(counterpart_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(notes,)| notes))
    }
}

#[async_trait]
impl StyleStore for SqliteStyleStore {
    async fn load_profile(&self, counterpart_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.fetch_profile(counterpart_id).await?)
    }

    async fn load_notes(&self, counterpart_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.fetch_notes(counterpart_id).await?)
    }
}
