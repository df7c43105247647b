//! Broadcast schedule CRUD.
//!
//! The store does not validate cron strings; malformed rows are kept and
//! simply never fire (the dispatcher skips them).

use super::Store;
use lantern_core::error::LanternError;
use serde::Serialize;

/// A stored broadcast schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: i64,
    pub name: String,
    pub chat_id: String,
    pub text: String,
    /// Five whitespace-separated cron fields: minute hour day month day-of-week.
    pub cron: String,
    pub enabled: bool,
}

type ScheduleRow = (i64, String, String, String, String, i64);

fn from_row((id, name, chat_id, text, cron, enabled): ScheduleRow) -> Schedule {
    Schedule {
        id,
        name,
        chat_id,
        text,
        cron,
        enabled: enabled == 1,
    }
}

impl Store {
    /// Create an enabled schedule. Returns its id.
    pub async fn create_schedule(
        &self,
        name: &str,
        chat_id: &str,
        text: &str,
        cron: &str,
    ) -> Result<i64, LanternError> {
        let result = sqlx::query(
            "INSERT INTO schedules (name, chat_id, text, cron, enabled) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(name)
        .bind(chat_id)
        .bind(text)
        .bind(cron)
        .execute(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("create schedule failed: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// All schedules, newest first.
    pub async fn list_schedules(&self) -> Result<Vec<Schedule>, LanternError> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT id, name, chat_id, text, cron, enabled FROM schedules ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("list schedules failed: {e}")))?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    /// Fetch one schedule by id.
    pub async fn get_schedule(&self, id: i64) -> Result<Option<Schedule>, LanternError> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            "SELECT id, name, chat_id, text, cron, enabled FROM schedules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("get schedule failed: {e}")))?;

        Ok(row.map(from_row))
    }

    /// Enable or disable a schedule. Returns `false` if no such schedule exists.
    pub async fn set_schedule_enabled(&self, id: i64, enabled: bool) -> Result<bool, LanternError> {
        let result = sqlx::query("UPDATE schedules SET enabled = ? WHERE id = ?")
            .bind(i64::from(enabled))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| LanternError::Memory(format!("toggle schedule failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a schedule. Returns `false` if no such schedule exists.
    pub async fn delete_schedule(&self, id: i64) -> Result<bool, LanternError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| LanternError::Memory(format!("delete schedule failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
