//! Ordered FAQ patterns with canned answers.

use super::lexicon::FAQ;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

fn table() -> &'static [(Regex, &'static str)] {
    static TABLE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        FAQ.iter()
            .filter_map(|(pattern, answer)| match Regex::new(pattern) {
                Ok(re) => Some((re, *answer)),
                Err(e) => {
                    warn!("skipping invalid FAQ pattern {pattern:?}: {e}");
                    None
                }
            })
            .collect()
    })
}

/// Canned answer for the first pattern that matches the lowercased text.
pub fn match_faq(text: &str) -> Option<&'static str> {
    let low = text.to_lowercase();
    table()
        .iter()
        .find(|(re, _)| re.is_match(&low))
        .map(|(_, answer)| *answer)
}
