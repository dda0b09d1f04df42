//! Command dispatch: one parsed command in, the replies it causes out.

use duoplex_protocol::{Command, Reply, SessionId};
use duoplex_room::{JoinKind, relay_move};
use duoplex_session::{Account, LoginOutcome, StoreError};

use crate::Lobby;

/// Who gets which reply. Order matters: lines are queued in this order.
pub(crate) type Outbox = Vec<(SessionId, Reply)>;

impl Lobby {
    /// Applies `command` from `session` to the store, registry and rooms.
    ///
    /// No command requires a prior LOGIN.
    pub(crate) fn dispatch(&mut self, session: SessionId, command: Command) -> Outbox {
        match command {
            Command::Login { username, password } => self.login(session, username, &password),
            Command::CreateAccount { username, password } => {
                self.create_account(session, username, password)
            }
            Command::JoinOrCreateRoom { room } => self.join_or_create(session, room),
            Command::LeaveRoom => self.leave_room(session),
            Command::Move { symbol, index } => self.relay(session, &symbol, index),
        }
    }

    fn login(&mut self, session: SessionId, username: String, password: &str) -> Outbox {
        let reply = match self.store.login(&username, password) {
            LoginOutcome::Success => {
                self.authenticate(session, &username);
                tracing::info!(%session, %username, "login succeeded");
                Reply::LoginSuccess { username }
            }
            LoginOutcome::WrongPassword => {
                tracing::info!(%session, %username, "login failed: wrong password");
                Reply::LoginFailed { username }
            }
            LoginOutcome::NotFound => {
                tracing::info!(%session, %username, "login failed: no such account");
                Reply::AccountNotFound
            }
        };
        vec![(session, reply)]
    }

    fn create_account(&mut self, session: SessionId, username: String, password: String) -> Outbox {
        let reply = match self.store.add(Account::new(username.clone(), password)) {
            Ok(()) => {
                self.authenticate(session, &username);
                Reply::AccountCreationSuccess
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::info!(%session, %username, "account creation refused: name taken");
                Reply::AccountCreationFailed
            }
            Err(e) => {
                tracing::error!(%session, %username, error = %e, "account creation failed");
                Reply::AccountCreationFailed
            }
        };
        vec![(session, reply)]
    }

    fn join_or_create(&mut self, session: SessionId, room: String) -> Outbox {
        let outcome = self.rooms.join_or_create(session, &room);
        let mut out = Vec::with_capacity(2);

        if let Some(old) = outcome.left {
            out.push((session, Reply::LeftRoom { room: old }));
        }
        self.track_room(session, Some(room.clone()));

        match outcome.kind {
            JoinKind::Created => out.push((session, Reply::RoomCreated { room })),
            JoinKind::Started { players } => {
                tracing::info!(%room, first = %players[0], second = %players[1], "game started");
                out.extend(players.into_iter().map(|p| (p, Reply::StartGame)));
            }
            JoinKind::Observing => {
                let observers = self.rooms.room(&room).map_or(0, |r| r.observers().count());
                tracing::info!(%session, %room, observers, "joined as observer");
                out.push((session, Reply::RoomFullObserver));
            }
        }
        out
    }

    fn leave_room(&mut self, session: SessionId) -> Outbox {
        let reply = match self.rooms.leave(session) {
            Ok(room) => {
                self.track_room(session, None);
                Reply::LeftRoom { room }
            }
            Err(_) => Reply::NotInRoom,
        };
        vec![(session, reply)]
    }

    fn relay(&self, session: SessionId, symbol: &str, index: i32) -> Outbox {
        match relay_move(&self.rooms, session, symbol, index) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(%session, %symbol, index, error = %e, "move dropped");
                Vec::new()
            }
        }
    }

    fn authenticate(&mut self, session: SessionId, username: &str) {
        if self.registry.get(session).is_some_and(|s| s.is_authenticated()) {
            tracing::debug!(%session, %username, "session switches account");
        }
        if let Err(e) = self.registry.set_authenticated(session, username) {
            tracing::warn!(%session, error = %e, "could not record login");
        }
    }

    fn track_room(&mut self, session: SessionId, room: Option<String>) {
        if let Err(e) = self.registry.set_room(session, room) {
            tracing::warn!(%session, error = %e, "could not record room");
        }
    }
}
