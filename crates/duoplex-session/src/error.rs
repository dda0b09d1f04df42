//! Error types for the session layer.

use duoplex_protocol::SessionId;

/// Errors from the account store and its persistence hook.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An account with this username is already registered.
    #[error("account {0:?} already exists")]
    AlreadyExists(String),

    /// The save hook could not accept the new account set.
    /// The insert that triggered it has been rolled back.
    #[error("failed to persist accounts: {0}")]
    Persist(String),

    /// Reading or writing the accounts file failed.
    #[error("accounts file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The accounts file exists but isn't valid account JSON.
    #[error("accounts file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from the connection registry.
///
/// These all mean the caller's bookkeeping is off (a session used after
/// it was unregistered, or registered twice). The lobby logs them and
/// carries on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session is registered under this id.
    #[error("session {0} not registered")]
    NotFound(SessionId),

    /// A session with this id is already registered.
    #[error("session {0} already registered")]
    AlreadyRegistered(SessionId),
}
