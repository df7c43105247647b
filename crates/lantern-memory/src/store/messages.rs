//! Append-only log of inbound messages.

use super::Store;
use lantern_core::error::LanternError;
use serde::Serialize;

/// One row of the inbound message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedMessage {
    pub ts: String,
    pub chat_id: String,
    pub username: String,
    pub text: String,
}

impl Store {
    /// Append an inbound message.
    pub async fn add_message(
        &self,
        chat_id: &str,
        username: &str,
        text: &str,
    ) -> Result<(), LanternError> {
        sqlx::query("INSERT INTO messages (chat_id, username, text) VALUES (?, ?, ?)")
            .bind(chat_id)
            .bind(username)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(|e| LanternError::Memory(format!("insert message failed: {e}")))?;

        Ok(())
    }

    /// Most recent messages first, capped at `limit`.
    pub async fn list_messages(&self, limit: i64) -> Result<Vec<LoggedMessage>, LanternError> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT ts, chat_id, username, text FROM messages ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("list messages failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(ts, chat_id, username, text)| LoggedMessage {
                ts,
                chat_id,
                username,
                text,
            })
            .collect())
    }
}
