//! Message sending and update housekeeping.

use super::TelegramChannel;
use crate::utils::split_message;
use lantern_core::error::LanternError;
use serde_json::Value;
use tracing::{info, warn};

/// Telegram's per-message text limit.
const MAX_MESSAGE_LEN: usize = 4096;

/// Numeric chat ids go out as numbers, `@channel` handles as strings.
pub(crate) fn chat_id_value(chat_id: &str) -> Value {
    match chat_id.trim().parse::<i64>() {
        Ok(id) => Value::from(id),
        Err(_) => Value::from(chat_id.trim()),
    }
}

impl TelegramChannel {
    /// Send plain text to a chat. One attempt per chunk, no retry.
    pub(crate) async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), LanternError> {
        if chat_id.trim().is_empty() {
            return Err(LanternError::Delivery("empty chat_id".into()));
        }

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let url = format!("{}/sendMessage", self.base_url);
            let body = serde_json::json!({
                "chat_id": chat_id_value(chat_id),
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| LanternError::Delivery(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(LanternError::Delivery(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Discard updates queued while the bot was offline.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn drop_pending_updates(&self) {
        let url = format!("{}/deleteWebhook?drop_pending_updates=true", self.base_url);
        match self.client.post(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("dropped pending Telegram updates");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to drop pending Telegram updates: {body}");
            }
            Err(e) => {
                warn!("failed to drop pending Telegram updates: {e}");
            }
        }
    }
}
