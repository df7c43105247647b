use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Telegram Bot API client config.
///
/// The bot token itself is a runtime setting (see `settings::BOT_TOKEN`),
/// not part of the config file, so it can be changed from the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API root, without the `/bot<token>` suffix.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}
