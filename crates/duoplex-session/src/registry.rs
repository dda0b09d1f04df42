//! The connection registry: every live session, keyed by `SessionId`.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap` with no locking. It is owned
//! by the lobby task, which applies one event at a time, so there is
//! never a second reader or writer to race with.

use std::collections::HashMap;

use duoplex_protocol::{Reply, SessionId};

use crate::{Outbound, Session, SessionError};

/// All live sessions.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ set_authenticated() / set_room() ... ──→ unregister()
///     │                                                        │
///     ▼                                                        ▼
/// [anonymous, no room]                           [gone, outbound dropped]
/// ```
///
/// The registry never touches rooms itself. Before calling
/// [`unregister`](Self::unregister) the owner must remove the session
/// from its room, or the room would keep a dangling participant.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unauthenticated session with no room.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyRegistered`] if the id is in use;
    /// the existing entry is left alone.
    pub fn register(
        &mut self,
        id: SessionId,
        outbound: Outbound,
    ) -> Result<(), SessionError> {
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        self.sessions.insert(id, Session::new(id, outbound));
        tracing::debug!(session = %id, live = self.sessions.len(), "session registered");
        Ok(())
    }

    /// Removes a session and returns its record.
    ///
    /// Dropping the returned record drops the outbound sender, which ends
    /// the connection's writer task once its queue is empty.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the id isn't registered.
    pub fn unregister(&mut self, id: SessionId) -> Result<Session, SessionError> {
        let session = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        tracing::debug!(session = %id, live = self.sessions.len(), "session unregistered");
        Ok(session)
    }

    /// Records a successful LOGIN or CREATE_ACCOUNT. A later success
    /// replaces the username.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the id isn't registered.
    pub fn set_authenticated(
        &mut self,
        id: SessionId,
        username: impl Into<String>,
    ) -> Result<(), SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.set_username(username.into());
        Ok(())
    }

    /// Records which room the session is in (`None` after leaving).
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the id isn't registered.
    pub fn set_room(
        &mut self,
        id: SessionId,
        room: Option<String>,
    ) -> Result<(), SessionError> {
        let session = self.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.set_room(room);
        Ok(())
    }

    /// Queues a reply on the session's outbound channel.
    ///
    /// Returns `false` if the session is unknown or its writer has already
    /// gone away. Neither is an error: the connection is on its way out and
    /// its `Disconnected` event will follow.
    pub fn send(&self, id: SessionId, reply: &Reply) -> bool {
        let Some(session) = self.sessions.get(&id) else {
            tracing::warn!(session = %id, %reply, "reply for unknown session dropped");
            return false;
        };
        match session.outbound().send(reply.to_string()) {
            Ok(()) => {
                tracing::trace!(session = %id, %reply, "reply queued");
                true
            }
            Err(_) => {
                tracing::debug!(session = %id, %reply, "writer gone, reply dropped");
                false
            }
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
