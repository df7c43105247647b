//! Offline rule-based reply engine.
//!
//! Decision order, first match wins: safety screen, FAQ, short text,
//! emotion, help, question, default. Every branch body goes through the
//! configured persona before it is returned.

mod faq;
mod intent;
mod lexicon;
mod persona;
mod safety;
mod summary;

use intent::{classify, extract_topic};
pub use persona::Persona;

use lantern_core::{message::ConvoTurn, settings};
use lantern_memory::Store;
use lexicon::{
    CLARIFY_BODY, DEESCALATE_BODY, DEFAULT_PROMPT, EMOTION_BODY, HELP_CHECKLIST,
    HELP_CONTEXT_PREFIX, QUESTION_CHOICE, QUESTION_CONTEXT_PREFIX,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tracing::warn;

/// Produces replies for inbound chat messages.
pub struct ReplyEngine {
    store: Store,
    context_window: i64,
    rng: Mutex<StdRng>,
}

impl ReplyEngine {
    pub fn new(store: Store, context_window: i64) -> Self {
        Self::with_rng(store, context_window, StdRng::from_entropy())
    }

    /// Engine with a caller-supplied generator, for reproducible phrase picks.
    pub fn with_rng(store: Store, context_window: i64, rng: StdRng) -> Self {
        Self {
            store,
            context_window,
            rng: Mutex::new(rng),
        }
    }

    /// Reply to `text` from `chat_id`. Never fails and never returns an empty string.
    ///
    /// Store read errors degrade to the default persona and an empty context.
    pub async fn reply(&self, chat_id: &str, text: &str) -> String {
        let persona = match self.store.get_setting(settings::PERSONA).await {
            Ok(v) => Persona::from_setting(v.as_deref()),
            Err(e) => {
                warn!("persona lookup failed, using default: {e}");
                Persona::default()
            }
        };

        let turns = match self.store.recent_convo(chat_id, self.context_window).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!("context lookup failed for chat {chat_id}: {e}");
                Vec::new()
            }
        };

        // A poisoned generator is still a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        compose(text, persona, &turns, &mut *rng)
    }
}

/// Pure reply composition over already-loaded persona and context.
pub fn compose<R: Rng + ?Sized>(
    text: &str,
    persona: Persona,
    turns: &[ConvoTurn],
    rng: &mut R,
) -> String {
    let text = text.trim();
    persona.wrap(&body(text, turns), rng)
}

fn body(text: &str, turns: &[ConvoTurn]) -> String {
    if safety::should_deescalate(text) {
        return DEESCALATE_BODY.to_string();
    }

    if let Some(answer) = faq::match_faq(text) {
        return answer.to_string();
    }

    let intent = classify(text);
    if intent.short {
        return CLARIFY_BODY.to_string();
    }
    if intent.emotion {
        return EMOTION_BODY.to_string();
    }

    let ctx = summary::summarize(turns);

    if intent.help {
        return if ctx.is_empty() {
            HELP_CHECKLIST.to_string()
        } else {
            format!("{HELP_CHECKLIST} {HELP_CONTEXT_PREFIX} {ctx}.")
        };
    }

    if intent.question {
        let topic = extract_topic(&text.replace('?', ""));
        let mut out = format!("Mình hiểu bạn đang hỏi về: “{topic}”. {QUESTION_CHOICE}");
        if !ctx.is_empty() {
            out.push_str(&format!(" {QUESTION_CONTEXT_PREFIX} {ctx}."));
        }
        return out;
    }

    let topic = extract_topic(text);
    let mut out = format!("Mình nghe bạn nói: “{topic}”. {DEFAULT_PROMPT}");
    if !ctx.is_empty() {
        out.push_str(&format!(" ({QUESTION_CONTEXT_PREFIX} {ctx})"));
    }
    out
}
