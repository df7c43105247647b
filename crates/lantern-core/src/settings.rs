//! Keys and value conventions for the runtime settings table.
//!
//! Settings are read lazily before every use, never cached, so a change made
//! from the control panel is picked up by the next message or job firing.

/// Telegram bot token.
pub const BOT_TOKEN: &str = "bot_token";
/// Reply persona: `sweet`, `blunt`, or `sassy`.
pub const PERSONA: &str = "persona";
/// Display name of the bot.
pub const BOT_NAME: &str = "bot_name";
/// `"1"` enables auto-replies; any other value (or absence) disables them.
pub const AUTO_REPLY_ENABLED: &str = "auto_reply_enabled";

pub const DEFAULT_BOT_NAME: &str = "Bot";

/// Interpret the stored auto-reply flag.
pub fn auto_reply_from(value: Option<&str>) -> bool {
    value.unwrap_or("0") == "1"
}

/// Normalise a stored bot name, falling back to the default.
pub fn bot_name_from(value: Option<&str>) -> String {
    let name = value.unwrap_or(DEFAULT_BOT_NAME).trim();
    if name.is_empty() {
        DEFAULT_BOT_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Normalise a token: trimmed, `None` when empty.
pub fn token_from(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_reply_only_exact_one() {
        assert!(auto_reply_from(Some("1")));
        assert!(!auto_reply_from(Some("0")));
        assert!(!auto_reply_from(Some("true")));
        assert!(!auto_reply_from(None));
    }

    #[test]
    fn test_bot_name_defaults() {
        assert_eq!(bot_name_from(None), "Bot");
        assert_eq!(bot_name_from(Some("   ")), "Bot");
        assert_eq!(bot_name_from(Some(" Mia ")), "Mia");
    }

    #[test]
    fn test_token_from_trims_and_rejects_empty() {
        assert_eq!(token_from(Some(" abc ")).as_deref(), Some("abc"));
        assert_eq!(token_from(Some("")), None);
        assert_eq!(token_from(None), None);
    }
}
