//! Gateway: the bot session, its inbound listener, and the schedule dispatcher.
//!
//! One `BotSession` is built at startup and shared by reference with the
//! dispatcher and the control panel. It owns at most one listener task.

mod dispatcher;
mod listener;

pub use dispatcher::{parse_cron, Dispatcher};

use crate::reply::ReplyEngine;
use lantern_core::{
    config::MemoryConfig,
    error::LanternError,
    message::OutgoingMessage,
    settings,
    traits::Connector,
};
use lantern_memory::Store;
use listener::Inbound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Lifecycle of the bot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    /// Listener task launched, platform subscription not yet established.
    Starting,
    Running,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
        }
    }
}

struct Listener {
    cancel: CancellationToken,
    subscribed: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Listener {
    fn alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// The single bot session: token, listener lifecycle, and one-shot sends.
pub struct BotSession {
    connector: Arc<dyn Connector>,
    inbound: Arc<Inbound>,
    token: RwLock<Option<String>>,
    listener: Mutex<Option<Listener>>,
}

impl BotSession {
    pub fn new(connector: Arc<dyn Connector>, store: Store, memory: &MemoryConfig) -> Self {
        let engine = ReplyEngine::new(store.clone(), memory.context_window);
        Self::with_engine(connector, store, engine, memory.convo_keep)
    }

    pub fn with_engine(
        connector: Arc<dyn Connector>,
        store: Store,
        engine: ReplyEngine,
        convo_keep: i64,
    ) -> Self {
        Self {
            connector,
            inbound: Arc::new(Inbound::new(store, engine, convo_keep)),
            token: RwLock::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Store the token for the next `start` and for every `send`.
    ///
    /// A running listener keeps the connection it was started with.
    pub fn configure(&self, token: &str) {
        let token = settings::token_from(Some(token));
        let mut slot = self.token.write().unwrap_or_else(|p| p.into_inner());
        *slot = token;
    }

    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Pick up the token from the settings table, if one is stored.
    pub async fn reload_token(&self, store: &Store) -> Result<(), LanternError> {
        let stored = store.get_setting(settings::BOT_TOKEN).await?;
        if let Some(token) = settings::token_from(stored.as_deref()) {
            self.configure(&token);
        }
        Ok(())
    }

    /// Launch the listener. No-op while a listener is alive.
    pub fn start(&self) -> Result<(), LanternError> {
        let mut slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        if slot.as_ref().is_some_and(Listener::alive) {
            return Ok(());
        }

        let token = self
            .current_token()
            .ok_or_else(|| LanternError::Config("no bot token configured".into()))?;

        let channel = self.connector.connect(&token);
        let cancel = CancellationToken::new();
        let subscribed = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(listener::run(
            channel,
            Arc::clone(&self.inbound),
            cancel.clone(),
            Arc::clone(&subscribed),
        ));

        info!("bot session starting");
        *slot = Some(Listener {
            cancel,
            subscribed,
            handle,
        });
        Ok(())
    }

    /// Ask the listener to shut down. Returns without waiting for it.
    pub fn stop(&self) {
        let slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        match slot.as_ref() {
            Some(l) if l.alive() => {
                info!("bot session stop requested");
                l.cancel.cancel();
            }
            _ => {}
        }
    }

    /// Whether the listener task is alive.
    pub fn running(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(Listener::alive)
    }

    pub fn state(&self) -> SessionState {
        let slot = self.listener.lock().unwrap_or_else(|p| p.into_inner());
        match slot.as_ref() {
            Some(l) if l.alive() && l.subscribed.load(Ordering::Acquire) => SessionState::Running,
            Some(l) if l.alive() => SessionState::Starting,
            _ => SessionState::Stopped,
        }
    }

    /// Send one message over a fresh connection, independent of the listener.
    pub async fn send(&self, chat_id: &str, text: &str) -> Result<(), LanternError> {
        let token = self
            .current_token()
            .ok_or_else(|| LanternError::Config("no bot token configured".into()))?;

        let channel = self.connector.connect(&token);
        channel
            .send(OutgoingMessage::new(chat_id, text))
            .await
            .map_err(|e| match e {
                LanternError::Delivery(_) => e,
                other => LanternError::Delivery(other.to_string()),
            })
    }

    /// Stop the listener and wait for it to exit.
    pub async fn shutdown(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(l) = listener {
            l.cancel.cancel();
            if let Err(e) = l.handle.await {
                warn!("listener task ended abnormally: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests;
