//! Room manager: creates, tracks, and deletes named rooms.

use std::collections::HashMap;

use duoplex_protocol::SessionId;

use crate::{MAX_ACTIVE_PLAYERS, Role, Room, RoomError};

/// What a join did to the room that was joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKind {
    /// The room didn't exist; the joiner is its only participant.
    Created,
    /// The joiner was the second participant. Both players should be
    /// told the game has started.
    Started { players: [SessionId; MAX_ACTIVE_PLAYERS] },
    /// The room already had two or more participants; the joiner watches.
    Observing,
}

/// Everything a [`RoomManager::join_or_create`] call changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The room the session was in before, if any. It has already been
    /// left, exactly as [`RoomManager::leave`] would.
    pub left: Option<String>,
    /// The room the session is in now.
    pub room: String,
    pub kind: JoinKind,
}

/// Manages all rooms and tracks which session is in which room.
///
/// A session can be in at most ONE room at a time (key invariant). The
/// `index` map mirrors the participant lists exactly, so "which room is
/// this session in" never needs a scan.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// Live rooms, keyed by name. Never holds an empty room.
    rooms: HashMap<String, Room>,

    /// Maps each participating session to its room's name.
    index: HashMap<SessionId, String>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `session` into the room called `name`, creating it if needed.
    ///
    /// A session that is already in a room leaves it first. Joining the
    /// room you are already in is a leave followed by a fresh join.
    pub fn join_or_create(&mut self, session: SessionId, name: &str) -> JoinOutcome {
        let left = self.leave(session).ok();

        let room = self
            .rooms
            .entry(name.to_owned())
            .or_insert_with(|| Room::new(name));
        let role = room.add(session);
        let count = room.len();
        self.index.insert(session, name.to_owned());

        let kind = match (role, count) {
            (Role::Player, 1) => JoinKind::Created,
            (Role::Player, MAX_ACTIVE_PLAYERS) => {
                let mut players = room.players();
                match (players.next(), players.next()) {
                    (Some(first), Some(second)) => JoinKind::Started {
                        players: [first, second],
                    },
                    // Unreachable: two participants are always two players.
                    _ => JoinKind::Observing,
                }
            }
            _ => JoinKind::Observing,
        };

        tracing::info!(
            %session,
            room = %name,
            %role,
            participants = count,
            "session joined room"
        );

        JoinOutcome {
            left,
            room: name.to_owned(),
            kind,
        }
    }

    /// Removes `session` from its room and returns the room's name.
    ///
    /// A room left empty is deleted; its name is free for reuse at once.
    ///
    /// # Errors
    /// Returns [`RoomError::NotInRoom`] if the session isn't in any room.
    pub fn leave(&mut self, session: SessionId) -> Result<String, RoomError> {
        let name = self
            .index
            .remove(&session)
            .ok_or(RoomError::NotInRoom(session))?;

        let Some(room) = self.rooms.get_mut(&name) else {
            tracing::warn!(%session, room = %name, "index pointed at a missing room");
            return Ok(name);
        };

        let role = room.remove(session);
        let remaining = room.len();
        tracing::info!(%session, room = %name, ?role, remaining, "session left room");

        if remaining == 0 {
            self.rooms.remove(&name);
            tracing::info!(room = %name, "room deleted");
        }
        Ok(name)
    }

    /// Returns the name of the room `session` is in, if any.
    pub fn room_of(&self, session: SessionId) -> Option<&str> {
        self.index.get(&session).map(String::as_str)
    }

    /// Looks up a room by name.
    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room names, sorted.
    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn sid(n: u64) -> SessionId {
        SessionId(n)
    }

    // =====================================================================
    // join_or_create()
    // =====================================================================

    #[test]
    fn test_join_or_create_absent_room_creates_it() {
        let mut mgr = RoomManager::new();

        let out = mgr.join_or_create(sid(1), "r1");

        assert_eq!(out.kind, JoinKind::Created);
        assert_eq!(out.left, None);
        assert_eq!(mgr.room_of(sid(1)), Some("r1"));
        assert_eq!(mgr.room_count(), 1);
    }

    #[test]
    fn test_join_or_create_second_joiner_starts_game() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");

        let out = mgr.join_or_create(sid(2), "r1");

        assert_eq!(
            out.kind,
            JoinKind::Started {
                players: [sid(1), sid(2)]
            }
        );
    }

    #[test]
    fn test_join_or_create_third_joiner_observes() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");
        mgr.join_or_create(sid(2), "r1");

        let out = mgr.join_or_create(sid(3), "r1");

        assert_eq!(out.kind, JoinKind::Observing);
        let room = mgr.room("r1").unwrap();
        assert_eq!(room.role_of(sid(3)), Some(Role::Observer));
        assert_eq!(room.len(), 3);
    }

    #[test]
    fn test_join_or_create_while_in_room_leaves_old_room() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");
        mgr.join_or_create(sid(2), "r1");

        let out = mgr.join_or_create(sid(1), "r2");

        assert_eq!(out.left.as_deref(), Some("r1"));
        assert_eq!(out.kind, JoinKind::Created);
        assert!(!mgr.room("r1").unwrap().contains(sid(1)));
        assert_eq!(mgr.room_of(sid(1)), Some("r2"));
    }

    #[test]
    fn test_join_or_create_same_room_alone_recreates_it() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");

        let out = mgr.join_or_create(sid(1), "r1");

        assert_eq!(out.left.as_deref(), Some("r1"));
        assert_eq!(out.kind, JoinKind::Created);
        assert_eq!(mgr.room("r1").unwrap().len(), 1);
    }

    #[test]
    fn test_join_or_create_after_player_left_refills_slot() {
        // Two players, one leaves: the next joiner is a player again and
        // the game starts with the one who stayed.
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");
        mgr.join_or_create(sid(2), "r1");
        mgr.leave(sid(1)).unwrap();

        let out = mgr.join_or_create(sid(3), "r1");

        assert_eq!(
            out.kind,
            JoinKind::Started {
                players: [sid(2), sid(3)]
            }
        );
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_not_in_room_returns_error() {
        let mut mgr = RoomManager::new();

        let result = mgr.leave(sid(1));

        assert_eq!(result, Err(RoomError::NotInRoom(sid(1))));
    }

    #[test]
    fn test_leave_returns_room_name() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");
        mgr.join_or_create(sid(2), "r1");

        assert_eq!(mgr.leave(sid(1)).unwrap(), "r1");
        assert_eq!(mgr.room_of(sid(1)), None);
        assert_eq!(mgr.room("r1").unwrap().len(), 1);
    }

    #[test]
    fn test_leave_last_participant_deletes_room() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");

        mgr.leave(sid(1)).unwrap();

        assert!(mgr.room("r1").is_none());
        assert_eq!(mgr.room_count(), 0);
    }

    #[test]
    fn test_leave_twice_second_returns_error() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "r1");
        mgr.leave(sid(1)).unwrap();

        assert!(mgr.leave(sid(1)).is_err());
    }

    #[test]
    fn test_leave_player_promotes_observer() {
        let mut mgr = RoomManager::new();
        for n in 1..=3 {
            mgr.join_or_create(sid(n), "r1");
        }

        mgr.leave(sid(2)).unwrap();

        let room = mgr.room("r1").unwrap();
        assert_eq!(room.players().collect::<Vec<_>>(), vec![sid(1), sid(3)]);
    }

    // =====================================================================
    // room_names()
    // =====================================================================

    #[test]
    fn test_room_names_sorted() {
        let mut mgr = RoomManager::new();
        mgr.join_or_create(sid(1), "zeta");
        mgr.join_or_create(sid(2), "alpha");

        assert_eq!(mgr.room_names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
