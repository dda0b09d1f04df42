//! Room management for Duoplex.
//!
//! Rooms are named, created on first join and deleted when the last
//! participant leaves. The first two participants of a room are its
//! players; everyone after them observes.
//!
//! # Key types
//!
//! - [`RoomManager`]: owns every room and the session → room index
//! - [`Room`]: one room's ordered participant list
//! - [`Role`]: player or observer, always derived from position
//! - [`relay_move`]: fans a move out to everyone in the mover's room
//!
//! All of it is plain synchronous data. The lobby task owns the manager
//! and turns each outcome into replies.

mod error;
mod manager;
mod relay;
mod room;

pub use error::RoomError;
pub use manager::{JoinKind, JoinOutcome, RoomManager};
pub use relay::relay_move;
pub use room::{MAX_ACTIVE_PLAYERS, Participant, Role, Room};
