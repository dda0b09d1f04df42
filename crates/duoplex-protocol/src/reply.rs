//! Outbound replies and their wire rendering.

use std::fmt;

use crate::FIELD_SEPARATOR;

/// A message from the server to one client.
///
/// `Display` renders the exact wire line, without a terminator. The
/// transport decides how lines are framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `LOGIN_SUCCESS|<username>`
    LoginSuccess { username: String },
    /// `LOGIN_FAILED|<username>`: the account exists, the password doesn't match.
    LoginFailed { username: String },
    /// `ACCOUNT_NOT_FOUND`
    AccountNotFound,
    /// `ACCOUNT_CREATION_SUCCESS`
    AccountCreationSuccess,
    /// `ACCOUNT_CREATION_FAILED`
    AccountCreationFailed,
    /// `ROOM_CREATED|<room>`
    RoomCreated { room: String },
    /// `START_GAME`: sent to both players when the second one arrives.
    StartGame,
    /// `ROOM_FULL_OBSERVER`
    RoomFullObserver,
    /// `LEFT_ROOM|<room>`
    LeftRoom { room: String },
    /// `NOT_IN_ROOM`
    NotInRoom,
    /// `MOVE|<symbol>|<index>`: a relayed move.
    Move { symbol: String, index: i32 },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SEP: char = FIELD_SEPARATOR;
        match self {
            Self::LoginSuccess { username } => {
                write!(f, "LOGIN_SUCCESS{SEP}{username}")
            }
            Self::LoginFailed { username } => {
                write!(f, "LOGIN_FAILED{SEP}{username}")
            }
            Self::AccountNotFound => f.write_str("ACCOUNT_NOT_FOUND"),
            Self::AccountCreationSuccess => {
                f.write_str("ACCOUNT_CREATION_SUCCESS")
            }
            Self::AccountCreationFailed => {
                f.write_str("ACCOUNT_CREATION_FAILED")
            }
            Self::RoomCreated { room } => write!(f, "ROOM_CREATED{SEP}{room}"),
            Self::StartGame => f.write_str("START_GAME"),
            Self::RoomFullObserver => f.write_str("ROOM_FULL_OBSERVER"),
            Self::LeftRoom { room } => write!(f, "LEFT_ROOM{SEP}{room}"),
            Self::NotInRoom => f.write_str("NOT_IN_ROOM"),
            Self::Move { symbol, index } => {
                write!(f, "MOVE{SEP}{symbol}{SEP}{index}")
            }
        }
    }
}
