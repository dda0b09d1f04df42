//! Server configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which wire framing the server listens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Newline-delimited lines over plain TCP.
    #[default]
    Tcp,
    /// One line per WebSocket text frame.
    WebSocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::WebSocket => f.write_str("websocket"),
        }
    }
}

/// Returned when a transport name isn't one of `tcp`, `websocket` or `ws`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport {0:?}, expected \"tcp\" or \"websocket\"")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "websocket" | "ws" => Ok(Self::WebSocket),
            _ => Err(UnknownTransport(s.to_owned())),
        }
    }
}

/// Everything needed to start a server.
///
/// `Default` gives a local TCP server on port 8080 with in-memory
/// accounts and no idle timeout. It allows 1000 connections and gives
/// each one 10 seconds to finish its handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `"0.0.0.0:8080"`.
    pub bind: String,

    pub transport: TransportKind,

    /// JSON file the accounts are loaded from at startup and rewritten to
    /// on every registration. `None` keeps accounts in memory only.
    pub accounts_path: Option<PathBuf>,

    /// Disconnect a client that sends nothing for this long.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,

    /// Connections beyond this many are closed right after accept.
    pub max_connections: usize,

    /// How long an accepted peer may take to finish the transport
    /// handshake (the WebSocket upgrade) before it is dropped.
    pub handshake_timeout: Duration,
}

/// Default for [`ServerConfig::handshake_timeout`].
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            transport: TransportKind::Tcp,
            accounts_path: None,
            idle_timeout: None,
            max_connections: 1000,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}
