//! Context summary from the rolling conversation window.

use super::intent::extract_topic;
use lantern_core::message::{ConvoTurn, Role};

/// Separator between summarized turns.
pub const SUMMARY_SEPARATOR: &str = " | ";

/// Topics of the last two user turns, older first, joined by [`SUMMARY_SEPARATOR`].
///
/// Scans newest to oldest and stops at the second user turn; bot turns are
/// skipped. Empty when the window has no user turns.
pub fn summarize(turns: &[ConvoTurn]) -> String {
    let mut picked: Vec<&str> = Vec::with_capacity(2);
    for turn in turns.iter().rev() {
        if turn.role == Role::User {
            picked.push(&turn.text);
            if picked.len() == 2 {
                break;
            }
        }
    }

    picked
        .iter()
        .rev()
        .map(|text| extract_topic(text))
        .filter(|topic| !topic.is_empty())
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}
