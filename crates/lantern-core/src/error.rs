use thiserror::Error;

/// Top-level error type for Lantern.
#[derive(Debug, Error)]
pub enum LanternError {
    /// Missing or invalid configuration (e.g. no bot token set).
    #[error("config error: {0}")]
    Config(String),

    /// An outbound platform call failed.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Fault inside a messaging channel (polling, parsing, protocol).
    #[error("channel error: {0}")]
    Channel(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LanternError {
    /// Whether this error should be shown to the operator as a setup problem.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
