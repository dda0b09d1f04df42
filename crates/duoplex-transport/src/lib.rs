//! Transport abstraction layer for Duoplex.
//!
//! Provides the [`Transport`] and [`Connection`] traits. Everything above
//! this crate deals in complete protocol lines; how those lines are framed
//! on the wire is the transport's business.
//!
//! # Implementations
//!
//! - [`TcpLineTransport`]: newline-delimited text over plain TCP, lines
//!   capped at [`MAX_LINE_LENGTH`] bytes
//! - `WebSocketTransport`: one line per text frame (feature `websocket`,
//!   on by default)
//!
//! A connection's receive and send paths are independent: one task can
//! wait in [`Connection::recv`] while another calls [`Connection::send`]
//! on the same connection.

mod codec;
mod error;
mod tcp;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use tcp::{MAX_LINE_LENGTH, TcpIncoming, TcpLineConnection, TcpLineTransport};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketIncoming, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all transports.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a transport connection.
///
/// Used for logging only; the lobby assigns its own session ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next process-wide connection id.
    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// Accepting is split in two. [`accept`](Transport::accept) only takes the
/// socket off the listener; [`Incoming::establish`] runs whatever
/// handshake the transport needs. The server calls `establish` on the
/// connection's own task, so a peer that stalls mid-handshake holds up
/// nobody else.
///
/// The returned futures are `Send` so a server generic over the transport
/// can drive them from spawned tasks.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// An accepted peer that hasn't finished its handshake.
    type Incoming: Incoming<Connection = Self::Connection>;

    /// Waits for the next peer on the listener.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Incoming, TransportError>> + Send;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A peer taken off the listener, before any handshake.
///
/// Dropping it closes the socket.
pub trait Incoming: Send + 'static {
    /// The connection this peer turns into.
    type Connection: Connection;

    /// The id the finished connection will carry.
    fn id(&self) -> ConnectionId;

    /// Completes the handshake and returns the ready connection.
    fn establish(
        self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that carries protocol lines in both directions.
pub trait Connection: Send + Sync + 'static {
    /// Sends one line to the remote peer. `line` carries no terminator.
    fn send(
        &self,
        line: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next complete line from the remote peer, without its
    /// terminator.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_next_is_unique() {
        assert_ne!(ConnectionId::next(), ConnectionId::next());
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId(7);
        assert_eq!(id.to_string(), "conn-7");
    }
}
