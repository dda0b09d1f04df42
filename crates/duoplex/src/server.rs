//! `ServerBuilder` and the server accept loop.
//!
//! This is the entry point for running a Duoplex server. It ties together
//! all the layers: transport → handler → lobby → session + room.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use duoplex_session::{AccountStore, JsonFileSink, MemorySink, load_accounts};
use duoplex_transport::{Incoming, TcpLineTransport, Transport, WebSocketTransport};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::handler::handle_connection;
use crate::lobby::{Lobby, LobbyHandle};
use crate::{DuoplexError, ServerConfig, TransportKind};

/// Builder for configuring and starting a Duoplex server.
///
/// # Example
///
/// ```rust,no_run
/// use duoplex::prelude::*;
///
/// # async fn start() -> Result<(), DuoplexError> {
/// let server = Server::builder()
///     .bind("0.0.0.0:8080")
///     .accounts_path("accounts.json")
///     .build_tcp()
///     .await?;
/// server.run_until(tokio::signal::ctrl_c()).await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.config.bind = addr.into();
        self
    }

    /// Picks the transport used by [`build`](Self::build).
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.config.transport = kind;
        self
    }

    /// Loads accounts from, and saves them to, this JSON file.
    pub fn accounts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.accounts_path = Some(path.into());
        self
    }

    /// Disconnects clients that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Caps the number of simultaneous connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Drops peers that don't finish the transport handshake in time.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Builds a server on the configured transport.
    pub async fn build(self) -> Result<AnyServer, DuoplexError> {
        match self.config.transport {
            TransportKind::Tcp => self.build_tcp().await.map(AnyServer::Tcp),
            TransportKind::WebSocket => self.build_websocket().await.map(AnyServer::WebSocket),
        }
    }

    /// Builds a server speaking newline-delimited TCP.
    pub async fn build_tcp(self) -> Result<Server<TcpLineTransport>, DuoplexError> {
        let transport = TcpLineTransport::bind(self.config.bind.as_str()).await?;
        self.build_with(transport).await
    }

    /// Builds a server speaking WebSocket, one line per text frame.
    pub async fn build_websocket(self) -> Result<Server<WebSocketTransport>, DuoplexError> {
        let transport = WebSocketTransport::bind(self.config.bind.as_str()).await?;
        self.build_with(transport).await
    }

    /// Builds a server on an already bound transport.
    ///
    /// Loads the accounts file (if configured) and starts the lobby task.
    ///
    /// # Errors
    /// Fails if the accounts file exists but can't be read or parsed.
    pub async fn build_with<T: Transport>(self, transport: T) -> Result<Server<T>, DuoplexError> {
        let (store, account_writer) = open_store(&self.config).await?;
        let (lobby, lobby_task) = Lobby::new(store).spawn();

        Ok(Server {
            transport,
            lobby,
            lobby_task,
            account_writer,
            limit: Arc::new(Semaphore::new(self.config.max_connections)),
            config: self.config,
        })
    }
}

/// Builds the account store, plus the file writer task when accounts are
/// persisted.
async fn open_store(
    config: &ServerConfig,
) -> Result<(AccountStore, Option<JoinHandle<()>>), DuoplexError> {
    let Some(path) = &config.accounts_path else {
        tracing::info!("no accounts file configured, accounts live in memory");
        return Ok((AccountStore::new(MemorySink::new()), None));
    };

    let accounts = load_accounts(path).await?;
    let (sink, writer) = JsonFileSink::spawn(path.clone());
    let store = AccountStore::with_accounts(accounts, sink);
    if store.is_empty() {
        tracing::info!(path = %path.display(), "no accounts yet");
    }
    Ok((store, Some(writer)))
}

/// A Duoplex server bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Server<T: Transport> {
    transport: T,
    lobby: LobbyHandle,
    lobby_task: JoinHandle<()>,
    /// Present when accounts are persisted to a file.
    account_writer: Option<JoinHandle<()>>,
    limit: Arc<Semaphore>,
    config: ServerConfig,
}

impl Server<TcpLineTransport> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<T: Transport> Server<T> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), DuoplexError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the accept loop until `signal` completes, then shuts down.
    ///
    /// Shutting down stops accepting and lets the lobby finish the events
    /// already queued. The lobby then stops, which closes every live
    /// connection. Before returning, this waits for the account writer,
    /// so every account a client was told about is on disk.
    pub async fn run_until<F: Future>(mut self, signal: F) -> Result<(), DuoplexError> {
        tracing::info!(
            addr = ?self.local_addr().ok(),
            max_connections = self.config.max_connections,
            "Duoplex server running"
        );
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("shutdown requested, no longer accepting");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(incoming) => self.serve(incoming),
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(self) {
        let Self {
            transport,
            lobby,
            lobby_task,
            account_writer,
            ..
        } = self;
        drop(transport);

        lobby.shutdown();
        if let Err(e) = lobby_task.await {
            tracing::error!(error = %e, "lobby task failed");
        }

        // The lobby owned the only sink, so the writer drains and exits.
        if let Some(writer) = account_writer {
            match writer.await {
                Ok(()) => tracing::info!("accounts flushed"),
                Err(e) => tracing::error!(error = %e, "account writer failed"),
            }
        }
        tracing::info!("Duoplex server stopped");
    }

    /// Spawns the task for one accepted peer, or drops it if the server
    /// is at capacity.
    ///
    /// The handshake runs on that task, bounded by the handshake timeout,
    /// so a stalled peer never holds up the accept loop.
    fn serve(&self, incoming: T::Incoming) {
        let conn_id = incoming.id();
        let Ok(permit) = Arc::clone(&self.limit).try_acquire_owned() else {
            tracing::warn!(%conn_id, max = self.config.max_connections, "connection limit reached, closing");
            drop(incoming);
            return;
        };

        let lobby = self.lobby.clone();
        let idle_timeout = self.config.idle_timeout;
        let handshake_timeout = self.config.handshake_timeout;
        tokio::spawn(async move {
            let _permit = permit;
            let conn = match tokio::time::timeout(handshake_timeout, incoming.establish()).await {
                Ok(Ok(conn)) => conn,
                Ok(Err(e)) => {
                    tracing::debug!(%conn_id, error = %e, "handshake failed");
                    return;
                }
                Err(_) => {
                    tracing::info!(%conn_id, timeout = ?handshake_timeout, "handshake timed out");
                    return;
                }
            };
            if let Err(e) = handle_connection(conn, lobby, idle_timeout).await {
                tracing::debug!(%conn_id, error = %e, "connection ended with error");
            }
        });
    }
}

/// A server on whichever transport the configuration named.
pub enum AnyServer {
    Tcp(Server<TcpLineTransport>),
    WebSocket(Server<WebSocketTransport>),
}

impl AnyServer {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Self::Tcp(server) => server.local_addr(),
            Self::WebSocket(server) => server.local_addr(),
        }
    }

    /// See [`Server::run_until`].
    pub async fn run_until<F: Future>(self, signal: F) -> Result<(), DuoplexError> {
        match self {
            Self::Tcp(server) => server.run_until(signal).await,
            Self::WebSocket(server) => server.run_until(signal).await,
        }
    }
}
