//! Long-polling update loop and Channel trait implementation.

use super::types::{TgMessage, TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use lantern_core::{
    error::LanternError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Longest pause between failed polls.
const MAX_BACKOFF_SECS: u64 = 60;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<IncomingMessage>, LanternError> {
        self.drop_pending_updates().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let poll_timeout = self.poll_timeout_secs;
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let offset = last_update_id.lock().await.map(|id| id + 1);

                let polled = tokio::select! {
                    _ = cancel.cancelled() => break,
                    polled = fetch_updates(&client, &base_url, offset, poll_timeout) => polled,
                };

                let updates = match polled {
                    Ok(updates) => updates,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
                        }
                        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        continue;
                    }
                };

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(msg) = update.message else {
                        continue;
                    };

                    if tx.send(to_incoming(msg)).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }

            debug!("telegram poll loop cancelled");
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), LanternError> {
        self.send_text(&message.chat_id, &message.text).await
    }

    async fn stop(&self) -> Result<(), LanternError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

/// One `getUpdates` round trip.
async fn fetch_updates(
    client: &reqwest::Client,
    base_url: &str,
    offset: Option<i64>,
    timeout_secs: u64,
) -> Result<Vec<TgUpdate>, LanternError> {
    let mut url = format!("{base_url}/getUpdates?timeout={timeout_secs}");
    if let Some(off) = offset {
        url.push_str(&format!("&offset={off}"));
    }

    let body: TgResponse<Vec<TgUpdate>> = client
        .get(&url)
        .timeout(Duration::from_secs(timeout_secs + 10))
        .send()
        .await
        .map_err(|e| LanternError::Channel(format!("getUpdates failed: {e}")))?
        .json()
        .await
        .map_err(|e| LanternError::Channel(format!("getUpdates parse failed: {e}")))?;

    if !body.ok {
        return Err(LanternError::Channel(format!(
            "telegram API error: {}",
            body.description.unwrap_or_default()
        )));
    }

    Ok(body.result.unwrap_or_default())
}

/// Flatten a Telegram message into the channel-neutral shape.
///
/// Media messages carry their caption as text; anything else gets empty text.
pub(crate) fn to_incoming(msg: TgMessage) -> IncomingMessage {
    let (username, from_bot) = match msg.from {
        Some(user) => (user.username.unwrap_or_default(), user.is_bot),
        None => (String::new(), false),
    };

    IncomingMessage {
        chat_id: msg.chat.id.to_string(),
        username,
        text: msg.text.or(msg.caption).unwrap_or_default(),
        from_bot,
        timestamp: chrono::Utc::now(),
    }
}
