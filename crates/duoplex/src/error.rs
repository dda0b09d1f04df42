//! Unified error type for Duoplex.

use duoplex_protocol::ProtocolError;
use duoplex_room::RoomError;
use duoplex_session::{SessionError, StoreError};
use duoplex_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuoplexError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A line that isn't a valid command.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The account store or its file (duplicate name, bad accounts file).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Connection registry bookkeeping.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation (not in a room).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The lobby task has stopped, so no new events can be delivered.
    #[error("lobby is no longer running")]
    LobbyClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoplex_protocol::SessionId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let duoplex_err: DuoplexError = err.into();
        assert!(matches!(duoplex_err, DuoplexError::Transport(_)));
        assert!(duoplex_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownCommand("JUMP".into());
        let duoplex_err: DuoplexError = err.into();
        assert!(matches!(duoplex_err, DuoplexError::Protocol(_)));
        assert!(duoplex_err.to_string().contains("JUMP"));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::AlreadyExists("bob".into());
        let duoplex_err: DuoplexError = err.into();
        assert!(matches!(duoplex_err, DuoplexError::Store(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotFound(SessionId(3));
        let duoplex_err: DuoplexError = err.into();
        assert!(matches!(duoplex_err, DuoplexError::Session(_)));
        assert!(duoplex_err.to_string().contains("S-3"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotInRoom(SessionId(1));
        let duoplex_err: DuoplexError = err.into();
        assert!(matches!(duoplex_err, DuoplexError::Room(_)));
    }
}
