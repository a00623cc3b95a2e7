//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("No active account. Please connect a wallet session first.")]
    NoAccount,

    /// The user declined a wallet request. Expected behaviour, not a fault —
    /// callers log it but never surface it through `last_error`.
    #[error("Request rejected by the user")]
    SessionRejected,

    #[error("The store has been destroyed. No further actions can be taken.")]
    StoreDestroyed,

    #[error("This title is already taken: {0}")]
    DuplicateTitle(String),

    #[error("An operation of this kind is already in flight for this campaign")]
    AlreadyInFlight,

    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
