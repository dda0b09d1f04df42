//! Error types for the room layer.

use duoplex_protocol::SessionId;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The session is not a participant of any room.
    #[error("session {0} is not in any room")]
    NotInRoom(SessionId),
}
