//! Conversation history store.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::trace;

use crate::engine::context::{HistoryLine, HistoryStore};

use super::StoreError;

/// SQLite-backed conversation history, keyed by counterpart.
#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    /// Create a store over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one message to a conversation.
    ///
    /// `is_generated` must be true for every line the engine wrote itself,
    /// so later invocations can keep the bot's phrasing out of the
    /// subject's style statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn append(
        &self,
        counterpart_id: &str,
        speaker: &str,
        is_generated: bool,
        text: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO messages (counterpart_id, speaker, is_generated, text) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(counterpart_id)
        .bind(speaker)
        .bind(is_generated)
        .bind(text)
        .execute(&self.pool)
        .await?;

        trace!(counterpart_id, speaker, is_generated, "message appended");
        Ok(())
    }

    /// Fetch up to `limit` most recent lines, ordered oldest to newest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on SQLite failure.
    pub async fn fetch_recent(
        &self,
        counterpart_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryLine>, StoreError> {
        let rows: Vec<(String, bool, String, String)> = sqlx::query_as(
            "SELECT speaker, is_generated, text, created_at FROM messages \
             WHERE counterpart_id = ?1 \
             ORDER BY id DESC LIMIT ?2",
        )
        .bind(counterpart_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: Vec<HistoryLine> = rows
            .into_iter()
            .map(|(speaker, is_generated, text, created_at)| HistoryLine {
                speaker,
                timestamp_label: timestamp_label(&created_at),
                is_generated,
                text,
            })
            .collect();
        lines.reverse();
        Ok(lines)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn recent(&self, counterpart_id: &str, limit: u32) -> anyhow::Result<Vec<HistoryLine>> {
        Ok(self.fetch_recent(counterpart_id, limit).await?)
    }
}

/// Render a SQLite `datetime('now')` value as a compact label.
///
/// Unparseable values pass through unchanged — a raw timestamp in a prompt
/// is better than none.
fn timestamp_label(created_at: &str) -> String {
    match NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt.format("%b %d %H:%M").to_string(),
        Err(_) => created_at.to_owned(),
    }
}
