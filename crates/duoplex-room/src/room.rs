//! A single room: a name and an ordered list of participants.

use std::fmt;

use duoplex_protocol::SessionId;

/// How many participants count as players. Everyone after them observes.
pub const MAX_ACTIVE_PLAYERS: usize = 2;

/// What a participant does in a room.
///
/// The role is always derived from position: the first
/// [`MAX_ACTIVE_PLAYERS`] participants are players, the rest observers.
/// It is stored explicitly so callers never have to recompute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player,
    Observer,
}

impl Role {
    fn for_position(index: usize) -> Self {
        if index < MAX_ACTIVE_PLAYERS {
            Self::Player
        } else {
            Self::Observer
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Observer => f.write_str("observer"),
        }
    }
}

/// One entry in a room's participant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub session: SessionId,
    pub role: Role,
}

/// A named room.
///
/// Participants are kept in arrival order. Removing someone shifts the
/// rest up, so when a player leaves the earliest observer takes the
/// free player slot.
#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    participants: Vec<Participant>,
}

impl Room {
    /// Creates an empty room. The manager adds the creator right away;
    /// a room is never left empty for longer than one operation.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            participants: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a session and returns the role it got.
    ///
    /// The caller guarantees the session is not already in this room.
    pub(crate) fn add(&mut self, session: SessionId) -> Role {
        debug_assert!(!self.contains(session), "{session} added twice");
        let role = Role::for_position(self.participants.len());
        self.participants.push(Participant { session, role });
        role
    }

    /// Removes a session and returns the role it had, or `None` if it
    /// wasn't here. Roles of the remaining participants are recomputed.
    pub(crate) fn remove(&mut self, session: SessionId) -> Option<Role> {
        let pos = self
            .participants
            .iter()
            .position(|p| p.session == session)?;
        let removed = self.participants.remove(pos);

        for (index, participant) in self.participants.iter_mut().enumerate().skip(pos) {
            let role = Role::for_position(index);
            if participant.role != role {
                tracing::info!(
                    room = %self.name,
                    session = %participant.session,
                    "observer promoted to player"
                );
                participant.role = role;
            }
        }

        Some(removed.role)
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.participants.iter().any(|p| p.session == session)
    }

    /// The role of `session`, if it's in this room.
    pub fn role_of(&self, session: SessionId) -> Option<Role> {
        self.participants
            .iter()
            .find(|p| p.session == session)
            .map(|p| p.role)
    }

    /// Every participant, in arrival order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Sessions holding a player slot, in arrival order.
    pub fn players(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.participants
            .iter()
            .filter(|p| p.role == Role::Player)
            .map(|p| p.session)
    }

    /// Sessions watching, in arrival order.
    pub fn observers(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.participants
            .iter()
            .filter(|p| p.role == Role::Observer)
            .map(|p| p.session)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u64) -> SessionId {
        SessionId(n)
    }

    fn room_with(n: u64) -> Room {
        let mut room = Room::new("r1");
        for i in 1..=n {
            room.add(sid(i));
        }
        room
    }

    #[test]
    fn test_add_first_two_are_players_rest_observe() {
        let mut room = Room::new("r1");

        assert_eq!(room.add(sid(1)), Role::Player);
        assert_eq!(room.add(sid(2)), Role::Player);
        assert_eq!(room.add(sid(3)), Role::Observer);
        assert_eq!(room.add(sid(4)), Role::Observer);

        assert_eq!(room.players().collect::<Vec<_>>(), vec![sid(1), sid(2)]);
        assert_eq!(room.observers().collect::<Vec<_>>(), vec![sid(3), sid(4)]);
    }

    #[test]
    fn test_remove_player_promotes_earliest_observer() {
        let mut room = room_with(4);

        assert_eq!(room.remove(sid(1)), Some(Role::Player));

        assert_eq!(room.role_of(sid(3)), Some(Role::Player));
        assert_eq!(room.role_of(sid(4)), Some(Role::Observer));
        assert_eq!(room.players().collect::<Vec<_>>(), vec![sid(2), sid(3)]);
    }

    #[test]
    fn test_remove_observer_keeps_players() {
        let mut room = room_with(3);

        assert_eq!(room.remove(sid(3)), Some(Role::Observer));

        assert_eq!(room.players().collect::<Vec<_>>(), vec![sid(1), sid(2)]);
        assert_eq!(room.len(), 2);
    }

    #[test]
    fn test_remove_unknown_session_returns_none() {
        let mut room = room_with(2);

        assert_eq!(room.remove(sid(9)), None);
        assert_eq!(room.len(), 2);
    }

    #[test]
    fn test_remove_keeps_arrival_order() {
        let mut room = room_with(4);
        room.remove(sid(2));

        let order: Vec<_> = room.participants().iter().map(|p| p.session).collect();
        assert_eq!(order, vec![sid(1), sid(3), sid(4)]);
    }

    #[test]
    fn test_roles_always_match_position() {
        let mut room = room_with(5);
        room.remove(sid(2));
        room.remove(sid(1));
        room.add(sid(6));

        for (index, p) in room.participants().iter().enumerate() {
            assert_eq!(p.role, Role::for_position(index), "at {index}");
        }
    }
}
