//! Inbound listener: drains the channel and runs each message through the pipeline.

use crate::reply::ReplyEngine;
use lantern_core::{
    error::LanternError,
    message::{IncomingMessage, OutgoingMessage, Role},
    settings,
    traits::Channel,
};
use lantern_memory::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Prefix that marks a bot command. Commands are never auto-replied to.
pub(super) const COMMAND_MARKER: &str = "/";

/// Stored in the conversation window in place of an empty message.
pub(super) const NON_TEXT_PLACEHOLDER: &str = "[non-text]";

/// Per-message pipeline: log, remember, maybe reply.
pub(super) struct Inbound {
    store: Store,
    engine: ReplyEngine,
    convo_keep: i64,
}

impl Inbound {
    pub(super) fn new(store: Store, engine: ReplyEngine, convo_keep: i64) -> Self {
        Self {
            store,
            engine,
            convo_keep,
        }
    }

    /// Handle one inbound message. Send failures are logged here;
    /// storage failures are returned.
    pub(super) async fn handle(
        &self,
        channel: &dyn Channel,
        incoming: IncomingMessage,
    ) -> Result<(), LanternError> {
        if incoming.from_bot {
            debug!("ignoring message from bot in chat {}", incoming.chat_id);
            return Ok(());
        }

        let chat_id = incoming.chat_id.as_str();
        let text = incoming.text.trim();

        self.store
            .add_message(chat_id, &incoming.username, &incoming.text)
            .await?;

        let turn = if text.is_empty() {
            NON_TEXT_PLACEHOLDER
        } else {
            text
        };
        self.store
            .add_convo(chat_id, Role::User, turn, self.convo_keep)
            .await?;

        let enabled = self
            .store
            .get_setting(settings::AUTO_REPLY_ENABLED)
            .await?;
        if !settings::auto_reply_from(enabled.as_deref()) {
            return Ok(());
        }
        if text.starts_with(COMMAND_MARKER) {
            debug!("not auto-replying to command in chat {chat_id}");
            return Ok(());
        }

        let reply = self.engine.reply(chat_id, text).await;
        match channel.send(OutgoingMessage::new(chat_id, reply.as_str())).await {
            Ok(()) => {
                self.store
                    .add_convo(chat_id, Role::Bot, &reply, self.convo_keep)
                    .await?;
            }
            Err(e) => warn!("auto-reply to chat {chat_id} failed: {e}"),
        }
        Ok(())
    }
}

/// Listener task body. Exits on cancellation or when the inbound stream closes.
pub(super) async fn run(
    channel: Arc<dyn Channel>,
    inbound: Arc<Inbound>,
    cancel: CancellationToken,
    subscribed: Arc<AtomicBool>,
) {
    let mut rx = match channel.start(cancel.clone()).await {
        Ok(rx) => rx,
        Err(e) => {
            error!("failed to start {} listener: {e}", channel.name());
            return;
        }
    };
    subscribed.store(true, Ordering::Release);
    info!("{} listener started", channel.name());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(msg) => {
                    if let Err(e) = inbound.handle(channel.as_ref(), msg).await {
                        error!("inbound message handling failed: {e}");
                    }
                }
                None => {
                    warn!("{} inbound stream closed", channel.name());
                    break;
                }
            },
        }
    }

    if let Err(e) = channel.stop().await {
        warn!("{} stop failed: {e}", channel.name());
    }
    info!("{} listener stopped", channel.name());
}
