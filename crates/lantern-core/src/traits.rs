use crate::{
    error::LanternError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Messaging channel: one live connection to a messaging platform.
///
/// A channel is bound to a single bot token. Implementations must yield
/// every inbound message, including ones sent by bots; filtering is the
/// caller's job.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Subscribe to inbound updates.
    ///
    /// The returned receiver closes once `cancel` fires or the platform
    /// connection is given up.
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, LanternError>;

    /// Send a single message. No retries.
    async fn send(&self, message: OutgoingMessage) -> Result<(), LanternError>;

    /// Graceful shutdown: release whatever `start` acquired.
    async fn stop(&self) -> Result<(), LanternError>;
}

/// Builds channels for a given token.
///
/// The session manager holds one of these instead of a channel so that
/// each listener run and each one-shot send gets its own connection,
/// built with whatever token is configured at that moment.
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Arc<dyn Channel>;
}
