//! Safety screen: abusive input gets a calm reply instead of normal processing.

use super::lexicon::DENYLIST;

/// Whether `text` contains a denylisted word (case-insensitive substring).
pub fn should_deescalate(text: &str) -> bool {
    let t = text.to_lowercase();
    DENYLIST.iter().any(|w| t.contains(w))
}
