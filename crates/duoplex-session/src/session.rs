//! The per-connection record.
//!
//! A "session" is the server's view of one live connection. It tracks:
//! - WHO the connection is (`SessionId`, assigned at connect time)
//! - HOW to reach it (an outbound line channel drained by its writer task)
//! - WHICH account it logged in as, if any
//! - WHERE it currently is (the room name, if any)

use duoplex_protocol::SessionId;
use tokio::sync::mpsc;

/// The sending half of a connection's outbound queue.
///
/// Each item is one encoded protocol line, without terminator. The
/// connection's writer task drains the queue in FIFO order, so lines reach
/// the client in the order the lobby queued them.
pub type Outbound = mpsc::UnboundedSender<String>;

/// One live connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    outbound: Outbound,
    username: Option<String>,
    room: Option<String>,
}

impl Session {
    /// Creates an unauthenticated session that is in no room.
    pub fn new(id: SessionId, outbound: Outbound) -> Self {
        Self {
            id,
            outbound,
            username: None,
            room: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The account this session last logged in (or registered) as.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The room this session is a participant of.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub(crate) fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub(crate) fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }

    pub(crate) fn set_room(&mut self, room: Option<String>) {
        self.room = room;
    }
}
