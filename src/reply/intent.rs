//! Intent classification and topic extraction.

use super::lexicon::{EMOTION_KW, GREETING_KW, HELP_KW, QUESTION_KW};

/// Longest topic, in characters, before truncation.
pub const TOPIC_MAX_CHARS: usize = 60;

/// Boolean intent flags for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub question: bool,
    pub help: bool,
    pub emotion: bool,
    pub greeting: bool,
    /// Trimmed text is three characters or fewer.
    pub short: bool,
}

fn kw_match(msg_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| msg_lower.contains(kw))
}

/// Classify a message. Pure: same text, same flags.
pub fn classify(text: &str) -> Intent {
    let t = text.trim().to_lowercase();
    Intent {
        question: t.contains('?') || kw_match(&t, QUESTION_KW),
        help: kw_match(&t, HELP_KW),
        emotion: kw_match(&t, EMOTION_KW),
        greeting: kw_match(&t, GREETING_KW),
        short: t.chars().count() <= 3,
    }
}

/// First line of the trimmed text, cut to [`TOPIC_MAX_CHARS`] with a trailing `…`.
pub fn extract_topic(text: &str) -> String {
    let first = text.trim().lines().next().unwrap_or("").trim();
    if first.chars().count() > TOPIC_MAX_CHARS {
        let mut cut: String = first.chars().take(TOPIC_MAX_CHARS).collect();
        cut.push('…');
        cut
    } else {
        first.to_string()
    }
}
