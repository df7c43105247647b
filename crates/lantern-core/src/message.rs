use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Platform chat identifier the message arrived in.
    pub chat_id: String,
    /// Sender username; empty when the platform does not provide one.
    #[serde(default)]
    pub username: String,
    /// Message text, or the caption for media messages. Empty for anything else.
    #[serde(default)]
    pub text: String,
    /// Set when the sender is itself a bot. Used to break reply loops.
    #[serde(default)]
    pub from_bot: bool,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(chat_id: impl Into<String>, username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            username: username.into(),
            text: text.into(),
            from_bot: false,
            timestamp: Utc::now(),
        }
    }
}

/// An outgoing message to send through a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Platform chat identifier (numeric id or `@channel` handle).
    pub chat_id: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}

/// Who authored a turn in the rolling conversation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Parse a stored role. Anything that is not `"user"` counts as the bot.
    pub fn from_stored(value: &str) -> Self {
        if value == "user" {
            Self::User
        } else {
            Self::Bot
        }
    }
}

/// One turn of the per-chat conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvoTurn {
    pub role: Role,
    pub text: String,
}

impl ConvoTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }
}
