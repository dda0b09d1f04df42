//! The lobby: the single task that owns all shared state.
//!
//! Accounts, live sessions and rooms all live inside one [`Lobby`]. Every
//! change arrives as an [`Event`] on one unbounded channel and is applied
//! to completion before the next one is looked at, so there are no locks
//! and no interleavings to reason about.
//!
//! ```text
//! handler ──Connected/Line/Disconnected──→ [ Lobby task ] ──reply lines──→ writer
//! handler ─────────────────────────────→        │        ──reply lines──→ writer
//!                                         store · registry · rooms
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use duoplex_protocol::{Command, Reply, SessionId};
use duoplex_room::RoomManager;
use duoplex_session::{AccountStore, ConnectionRegistry, Outbound, SessionError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::DuoplexError;

/// Something that happened on a connection.
#[derive(Debug)]
pub(crate) enum Event {
    /// A connection was accepted and given `session`.
    Connected { session: SessionId, outbound: Outbound },
    /// A complete line arrived from `session`.
    Line { session: SessionId, line: String },
    /// The connection behind `session` is gone.
    Disconnected { session: SessionId },
    /// The server is stopping. Events queued before this one are still
    /// applied; nothing after it is.
    Shutdown,
}

/// The state behind the lobby task.
///
/// The methods are synchronous; [`spawn`](Self::spawn) wraps them in the
/// event loop. Calling them directly applies one event right away, which
/// is what the unit tests do.
pub struct Lobby {
    pub(crate) store: AccountStore,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) rooms: RoomManager,
}

impl Lobby {
    pub fn new(store: AccountStore) -> Self {
        Self {
            store,
            registry: ConnectionRegistry::new(),
            rooms: RoomManager::new(),
        }
    }

    /// Starts the lobby task and returns the handle connections use to
    /// reach it. The task ends on [`LobbyHandle::shutdown`] or once every
    /// handle is dropped.
    ///
    /// When the task ends the lobby is dropped with it: every session's
    /// outbound queue closes and the account sink is released.
    pub(crate) fn spawn(self) -> (LobbyHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        let handle = LobbyHandle {
            events: tx,
            next_session: Arc::new(AtomicU64::new(1)),
        };
        (handle, task)
    }

    async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        tracing::info!(accounts = self.store.len(), "lobby started");
        while let Some(event) = events.recv().await {
            if matches!(event, Event::Shutdown) {
                tracing::info!(live = self.registry.len(), "lobby shutting down");
                break;
            }
            self.handle_event(event);
        }
        tracing::info!(accounts = self.store.len(), rooms = self.rooms.room_count(), "lobby stopped");
    }

    pub(crate) fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected { session, outbound } => self.connect(session, outbound),
            Event::Line { session, line } => self.handle_line(session, &line),
            Event::Disconnected { session } => self.disconnect(session),
            // Stops the loop in `run`; nothing to apply.
            Event::Shutdown => {}
        }
    }

    /// Registers a freshly accepted connection.
    pub fn connect(&mut self, session: SessionId, outbound: Outbound) {
        match self.registry.register(session, outbound) {
            Ok(()) => tracing::info!(%session, live = self.registry.len(), "session connected"),
            Err(e) => tracing::warn!(%session, error = %e, "ignoring connect"),
        }
    }

    /// Parses one line from `session`, applies it, and queues the replies.
    ///
    /// A line that doesn't parse is logged and dropped; the session gets
    /// no reply and stays connected.
    pub fn handle_line(&mut self, session: SessionId, line: &str) {
        if !self.registry.contains(session) {
            tracing::warn!(%session, %line, "line from unregistered session dropped");
            return;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(%session, %line, error = %e, "invalid command dropped");
                return;
            }
        };

        tracing::debug!(%session, command = command.name(), "dispatching");
        let replies = self.dispatch(session, command);
        self.deliver(replies);
    }

    /// Tears down a session: leaves its room, then unregisters it.
    ///
    /// The other participants of the room are not told. Any replies still
    /// queued for the session are abandoned with its outbound channel.
    pub fn disconnect(&mut self, session: SessionId) {
        if let Ok(room) = self.rooms.leave(session) {
            tracing::info!(%session, %room, "removed from room on disconnect");
        }

        match self.registry.unregister(session) {
            Ok(record) => tracing::info!(
                %session,
                username = record.username().unwrap_or("-"),
                live = self.registry.len(),
                "session disconnected"
            ),
            Err(SessionError::NotFound(_)) => {
                tracing::debug!(%session, "duplicate disconnect ignored");
            }
            Err(e) => tracing::warn!(%session, error = %e, "disconnect failed"),
        }
    }

    fn deliver(&self, replies: Vec<(SessionId, Reply)>) {
        for (to, reply) in replies {
            self.registry.send(to, &reply);
        }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }
}

/// A cloneable way into the lobby task.
///
/// Also hands out session ids, so every connection knows its own id
/// before the lobby has seen it.
#[derive(Debug, Clone)]
pub(crate) struct LobbyHandle {
    events: mpsc::UnboundedSender<Event>,
    next_session: Arc<AtomicU64>,
}

impl LobbyHandle {
    /// Allocates a session id and announces the connection.
    pub(crate) fn connect(&self, outbound: Outbound) -> Result<SessionId, DuoplexError> {
        let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        self.send(Event::Connected { session, outbound })?;
        Ok(session)
    }

    pub(crate) fn line(&self, session: SessionId, line: String) -> Result<(), DuoplexError> {
        self.send(Event::Line { session, line })
    }

    /// Announces that `session` is gone. Safe to call more than once.
    pub(crate) fn disconnect(&self, session: SessionId) {
        if self.send(Event::Disconnected { session }).is_err() {
            tracing::debug!(%session, "lobby gone, disconnect not delivered");
        }
    }

    /// Asks the lobby task to stop after the events already queued.
    pub(crate) fn shutdown(&self) {
        if self.send(Event::Shutdown).is_err() {
            tracing::debug!("lobby already stopped");
        }
    }

    fn send(&self, event: Event) -> Result<(), DuoplexError> {
        self.events.send(event).map_err(|_| DuoplexError::LobbyClosed)
    }
}

#[cfg(test)]
mod tests {
    //! These drive a `Lobby` directly, one event at a time, and read the
    //! lines each session would have been sent.

    use super::*;
    use duoplex_session::MemorySink;

    struct Client {
        id: SessionId,
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl Client {
        /// All lines queued so far.
        fn drain(&mut self) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(line) = self.rx.try_recv() {
                lines.push(line);
            }
            lines
        }
    }

    fn lobby() -> Lobby {
        Lobby::new(AccountStore::new(MemorySink::new()))
    }

    fn connect(lobby: &mut Lobby, n: u64) -> Client {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SessionId(n);
        lobby.handle_event(Event::Connected { session: id, outbound: tx });
        Client { id, rx }
    }

    fn send(lobby: &mut Lobby, client: &Client, line: &str) {
        lobby.handle_event(Event::Line {
            session: client.id,
            line: line.to_string(),
        });
    }

    #[test]
    fn test_handle_line_create_then_login_succeeds() {
        let mut lobby = lobby();
        let mut a = connect(&mut lobby, 1);

        send(&mut lobby, &a, "CREATE_ACCOUNT|alice|pw");
        send(&mut lobby, &a, "LOGIN|alice|pw");

        assert_eq!(a.drain(), vec!["ACCOUNT_CREATION_SUCCESS", "LOGIN_SUCCESS|alice"]);
        assert_eq!(lobby.registry().get(a.id).unwrap().username(), Some("alice"));
    }

    #[test]
    fn test_handle_line_invalid_command_sends_nothing() {
        let mut lobby = lobby();
        let mut a = connect(&mut lobby, 1);

        send(&mut lobby, &a, "DANCE|now");
        send(&mut lobby, &a, "LOGIN|only-one");
        send(&mut lobby, &a, "MOVE|X|four");
        send(&mut lobby, &a, "");

        assert!(a.drain().is_empty());
        assert!(lobby.registry().contains(a.id), "session must stay connected");
    }

    #[test]
    fn test_handle_line_unregistered_session_dropped() {
        let mut lobby = lobby();

        lobby.handle_line(SessionId(42), "LEAVE_ROOM");

        assert!(lobby.registry().is_empty());
    }

    #[test]
    fn test_disconnect_removes_session_from_room() {
        let mut lobby = lobby();
        let mut a = connect(&mut lobby, 1);
        let mut b = connect(&mut lobby, 2);
        send(&mut lobby, &a, "JOIN_OR_CREATE_ROOM|r1");
        send(&mut lobby, &b, "JOIN_OR_CREATE_ROOM|r1");
        a.drain();
        b.drain();

        lobby.handle_event(Event::Disconnected { session: a.id });

        let room = lobby.rooms().room("r1").expect("room should survive");
        assert!(!room.contains(a.id));
        assert!(room.contains(b.id));
        assert!(!lobby.registry().contains(a.id));
        assert!(b.drain().is_empty(), "survivor is not notified");
    }

    #[test]
    fn test_disconnect_last_participant_deletes_room() {
        let mut lobby = lobby();
        let a = connect(&mut lobby, 1);
        send(&mut lobby, &a, "JOIN_OR_CREATE_ROOM|r1");

        lobby.disconnect(a.id);

        assert_eq!(lobby.rooms().room_count(), 0);
    }

    #[test]
    fn test_disconnect_twice_is_ignored() {
        let mut lobby = lobby();
        let a = connect(&mut lobby, 1);
        let _b = connect(&mut lobby, 2);

        lobby.disconnect(a.id);
        lobby.disconnect(a.id);

        assert_eq!(lobby.registry().len(), 1);
    }

    #[test]
    fn test_connect_twice_keeps_first_outbound() {
        let mut lobby = lobby();
        let mut a = connect(&mut lobby, 1);
        let (tx, mut second) = mpsc::unbounded_channel();

        lobby.connect(a.id, tx);
        send(&mut lobby, &a, "LEAVE_ROOM");

        assert_eq!(a.drain(), vec!["NOT_IN_ROOM"]);
        assert!(second.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_spawn_handle_assigns_distinct_sessions() {
        let (handle, task) = lobby().spawn();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let s1 = handle.connect(tx1).unwrap();
        let s2 = handle.connect(tx2).unwrap();
        assert_ne!(s1, s2);

        handle.line(s1, "LEAVE_ROOM".into()).unwrap();
        assert_eq!(rx1.recv().await.as_deref(), Some("NOT_IN_ROOM"));

        handle.disconnect(s1);
        handle.disconnect(s2);
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_applies_queued_events_then_stops() {
        let sink = MemorySink::new();
        let (handle, task) = Lobby::new(AccountStore::new(sink.clone())).spawn();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let session = handle.connect(tx).unwrap();
        handle.line(session, "CREATE_ACCOUNT|alice|pw".into()).unwrap();
        handle.shutdown();
        task.await.unwrap();

        // Queued before the shutdown, so applied and answered.
        assert_eq!(rx.recv().await.as_deref(), Some("ACCOUNT_CREATION_SUCCESS"));
        assert_eq!(sink.save_count(), 1);
        // The lobby is gone, so the session's queue is closed.
        assert_eq!(rx.recv().await, None);
        assert!(matches!(
            handle.line(session, "LEAVE_ROOM".into()),
            Err(DuoplexError::LobbyClosed)
        ));
    }
}
