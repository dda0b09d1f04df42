//! # Duoplex
//!
//! A small session server for two-player turn-based games.
//!
//! Clients connect over TCP or WebSocket and speak a pipe-delimited line
//! protocol: they register and log in, meet in named rooms (two players,
//! any number of observers), and have their moves relayed to everyone in
//! the room. The server checks no game rules.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duoplex::prelude::*;
//!
//! # async fn start() -> Result<(), DuoplexError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:8080")
//!     .build_tcp()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod lobby;
mod server;

pub use config::{DEFAULT_HANDSHAKE_TIMEOUT, ServerConfig, TransportKind, UnknownTransport};
pub use error::DuoplexError;
pub use lobby::Lobby;
pub use server::{AnyServer, Server, ServerBuilder};

pub use duoplex_protocol as protocol;
pub use duoplex_room as room;
pub use duoplex_session as session;
pub use duoplex_transport as transport;

/// The types most servers need.
pub mod prelude {
    pub use crate::{AnyServer, DuoplexError, Server, ServerBuilder, ServerConfig, TransportKind};
}
