//! Error taxonomy for the chat flow and the local key-value store.

use thiserror::Error;

/// Failures surfaced by a send attempt. Every variant except [`ChatError::Busy`]
/// ends up on screen as a single `Error: <message>` line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Health check failed right before sending; no request was made.
    #[error("Not connected to the server")]
    NotConnected,

    /// The service answered with `{"error": ...}`.
    #[error("{0}")]
    Service(String),

    /// Non-2xx status, malformed body, or a network failure during `/ask`.
    #[error("{0}")]
    Transport(String),

    /// A request is already in flight.
    #[error("A request is already in progress")]
    Busy,
}

impl ChatError {
    /// Metadata tag written to the history log for this failure, if it is logged at all.
    pub fn log_tag(&self) -> Option<&'static str> {
        match self {
            ChatError::Service(_) => Some("Error"),
            ChatError::Transport(_) => Some("Connection Error"),
            ChatError::NotConnected | ChatError::Busy => None,
        }
    }
}

/// Key-value store failures. Never shown to the user.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
