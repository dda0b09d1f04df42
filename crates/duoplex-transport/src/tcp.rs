//! Newline-delimited TCP transport.
//!
//! Each line on the socket is one protocol message. Inbound lines may end
//! in `\n` or `\r\n`; outbound lines are written with a single `\n`.
//! Inbound lines longer than [`MAX_LINE_LENGTH`] bytes are dropped.

use std::net::SocketAddr;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio_util::codec::FramedRead;

use crate::codec::{Frame, LineCodec};
use crate::{Connection, ConnectionId, Incoming, Transport, TransportError};

/// Longest inbound line, in bytes, without its terminator.
pub const MAX_LINE_LENGTH: usize = 4096;

/// A [`Transport`] that accepts plain TCP clients speaking one line per
/// message.
pub struct TcpLineTransport {
    listener: TcpListener,
}

impl TcpLineTransport {
    /// Binds a new TCP line transport to the given address.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        if let Ok(local) = listener.local_addr() {
            tracing::info!(%local, "TCP line transport listening");
        }
        Ok(Self { listener })
    }
}

impl Transport for TcpLineTransport {
    type Connection = TcpLineConnection;
    type Incoming = TcpIncoming;

    async fn accept(&mut self) -> Result<TcpIncoming, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted TCP connection");
        Ok(TcpIncoming { id, stream, addr })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A TCP peer fresh off the listener. Plain TCP has no handshake, so
/// establishing it only sets the socket up.
pub struct TcpIncoming {
    id: ConnectionId,
    stream: TcpStream,
    addr: SocketAddr,
}

impl Incoming for TcpIncoming {
    type Connection = TcpLineConnection;

    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn establish(self) -> Result<TcpLineConnection, TransportError> {
        // Small request/reply lines: don't let Nagle hold them back.
        if let Err(e) = self.stream.set_nodelay(true) {
            tracing::debug!(id = %self.id, addr = %self.addr, error = %e, "set_nodelay failed");
        }

        let (read, write) = self.stream.into_split();
        Ok(TcpLineConnection {
            id: self.id,
            reader: Mutex::new(FramedRead::new(read, LineCodec::new(MAX_LINE_LENGTH))),
            writer: Mutex::new(write),
        })
    }
}

/// A single TCP connection.
///
/// The read and write halves sit behind separate locks so a reader
/// parked in `recv` never holds up a `send`.
pub struct TcpLineConnection {
    id: ConnectionId,
    reader: Mutex<FramedRead<OwnedReadHalf, LineCodec>>,
    writer: Mutex<OwnedWriteHalf>,
}

impl Connection for TcpLineConnection {
    async fn send(&self, line: &str) -> Result<(), TransportError> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push('\n');
        self.writer
            .lock()
            .await
            .write_all(framed.as_bytes())
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Frame::Line(line))) => return Ok(Some(line)),
                Some(Ok(Frame::Oversized)) => {
                    tracing::warn!(id = %self.id, max = MAX_LINE_LENGTH, "over-long line dropped");
                }
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e)),
                None => return Ok(None),
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
