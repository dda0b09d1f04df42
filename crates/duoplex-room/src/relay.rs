//! Move relay: fan a move out to everyone in the mover's room.

use duoplex_protocol::{Reply, SessionId};

use crate::{RoomError, RoomManager};

/// Builds the `MOVE` reply for every participant of `from`'s room.
///
/// The list is in participant order and includes the mover and any
/// observers. The server enforces no game rules: any participant may
/// move, in any order, to any index.
///
/// # Errors
/// Returns [`RoomError::NotInRoom`] if `from` isn't in a room. Callers
/// drop such moves without replying.
pub fn relay_move(
    rooms: &RoomManager,
    from: SessionId,
    symbol: &str,
    index: i32,
) -> Result<Vec<(SessionId, Reply)>, RoomError> {
    let room = rooms
        .room_of(from)
        .and_then(|name| rooms.room(name))
        .ok_or(RoomError::NotInRoom(from))?;

    let reply = Reply::Move {
        symbol: symbol.to_owned(),
        index,
    };
    tracing::debug!(
        session = %from,
        room = %room.name(),
        %symbol,
        index,
        recipients = room.len(),
        "relaying move"
    );

    Ok(room
        .participants()
        .iter()
        .map(|p| (p.session, reply.clone()))
        .collect())
}
