//! Wire protocol for Duoplex.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Commands** ([`Command`]): what a client asks for, parsed from one
//!   pipe-delimited line such as `MOVE|X|4`.
//! - **Replies** ([`Reply`]): what the server answers, rendered back to
//!   a line with `Display`.
//! - **Identity** ([`SessionId`]): the opaque id the server assigns to
//!   each connection.
//! - **Errors** ([`ProtocolError`]): why a line could not be parsed.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (text lines) and the lobby
//! (session and room state). It doesn't know about connections or rooms;
//! it only knows how to turn lines into commands and replies into lines.
//!
//! ```text
//! Transport (lines) → Protocol (Command / Reply) → Lobby (session context)
//! ```

mod command;
mod error;
mod reply;
mod types;

pub use command::Command;
pub use error::ProtocolError;
pub use reply::Reply;
pub use types::{FIELD_SEPARATOR, SessionId};
