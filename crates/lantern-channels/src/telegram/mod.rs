//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates` and `sendMessage` for responses.
//! Docs: <https://core.telegram.org/bots/api>

mod polling;
pub(crate) mod send;
pub(crate) mod types;


use lantern_core::config::TelegramConfig;
use lantern_core::traits::{Channel, Connector};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

impl TelegramChannel {
    /// Create a channel bound to one bot token.
    pub fn new(token: &str, config: &TelegramConfig) -> Self {
        Self::with_client(reqwest::Client::new(), token, config)
    }

    fn with_client(client: reqwest::Client, token: &str, config: &TelegramConfig) -> Self {
        let base_url = format!("{}/bot{}", config.api_base.trim_end_matches('/'), token);
        Self {
            client,
            base_url,
            poll_timeout_secs: config.poll_timeout_secs,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }
}

/// Builds a fresh [`TelegramChannel`] per token, sharing one HTTP client.
pub struct TelegramConnector {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramConnector {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

impl Connector for TelegramConnector {
    fn connect(&self, token: &str) -> Arc<dyn Channel> {
        Arc::new(TelegramChannel::with_client(
            self.client.clone(),
            token,
            &self.config,
        ))
    }
}
