//! Rolling per-chat conversation window.

use super::Store;
use lantern_core::{
    error::LanternError,
    message::{ConvoTurn, Role},
};

impl Store {
    /// Append a turn and prune the chat down to its newest `keep` turns.
    ///
    /// Insert and prune share one transaction, so a concurrent reader sees
    /// either the old window or the new one.
    pub async fn add_convo(
        &self,
        chat_id: &str,
        role: Role,
        text: &str,
        keep: i64,
    ) -> Result<(), LanternError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LanternError::Memory(format!("begin failed: {e}")))?;

        sqlx::query("INSERT INTO convo (chat_id, role, text) VALUES (?, ?, ?)")
            .bind(chat_id)
            .bind(role.as_str())
            .bind(text)
            .execute(&mut *tx)
            .await
            .map_err(|e| LanternError::Memory(format!("insert convo failed: {e}")))?;

        sqlx::query(
            "DELETE FROM convo WHERE chat_id = ? AND id NOT IN \
             (SELECT id FROM convo WHERE chat_id = ? ORDER BY id DESC LIMIT ?)",
        )
        .bind(chat_id)
        .bind(chat_id)
        .bind(keep.max(0))
        .execute(&mut *tx)
        .await
        .map_err(|e| LanternError::Memory(format!("prune convo failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| LanternError::Memory(format!("commit failed: {e}")))?;

        Ok(())
    }

    /// The newest `limit` turns of a chat, oldest first.
    pub async fn recent_convo(
        &self,
        chat_id: &str,
        limit: i64,
    ) -> Result<Vec<ConvoTurn>, LanternError> {
        let mut rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, text FROM convo WHERE chat_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("query convo failed: {e}")))?;

        rows.reverse();

        Ok(rows
            .into_iter()
            .map(|(role, text)| ConvoTurn {
                role: Role::from_stored(&role),
                text,
            })
            .collect())
    }

    /// Number of stored turns for a chat.
    pub async fn convo_len(&self, chat_id: &str) -> Result<i64, LanternError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM convo WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LanternError::Memory(format!("count convo failed: {e}")))?;

        Ok(count)
    }
}
