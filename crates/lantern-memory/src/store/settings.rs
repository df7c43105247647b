//! Key/value runtime settings. Last write wins, no history.

use super::Store;
use lantern_core::error::LanternError;

impl Store {
    /// Read a single setting.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, LanternError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LanternError::Memory(format!("get setting {key} failed: {e}")))?;

        Ok(row.map(|(v,)| v))
    }

    /// Create or overwrite a setting.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), LanternError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| LanternError::Memory(format!("set setting {key} failed: {e}")))?;

        Ok(())
    }
}
