//! Session management for Duoplex.
//!
//! This crate handles who a connection is and how to reach it:
//!
//! 1. **Accounts**: the registered users ([`AccountStore`]), written
//!    through to durable storage by an [`AccountSink`] on every new account
//! 2. **Sessions**: one record per live connection ([`ConnectionRegistry`]),
//!    holding its outbound channel, its login and its current room
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby (above)  ← owns the store and the registry, one event at a time
//!     ↕
//! Session Layer (this crate)  ← accounts and per-connection state
//!     ↕
//! Protocol Layer (below)  ← provides SessionId and Reply
//! ```
//!
//! Nothing here is thread-safe by itself. The lobby task owns both
//! structures outright; other tasks reach them only through its event
//! channel.

mod account;
mod error;
mod persist;
mod registry;
mod session;
mod store;

pub use account::Account;
pub use error::{SessionError, StoreError};
pub use persist::{JsonFileSink, MemorySink, load_accounts};
pub use registry::ConnectionRegistry;
pub use session::{Outbound, Session};
pub use store::{AccountSink, AccountStore, LoginOutcome};
