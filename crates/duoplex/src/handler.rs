//! Per-connection handler: feed lines to the lobby, drain replies back.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task. The flow is:
//!   1. Allocate a session and register it with the lobby
//!   2. Spawn the writer, which drains the session's outbound queue
//!   3. Loop: receive lines → forward each one to the lobby
//!   4. On end of stream, error, idle timeout or writer failure → the
//!      guard reports the disconnect, the writer drains, the socket closes

use std::sync::Arc;
use std::time::Duration;

use duoplex_protocol::SessionId;
use duoplex_transport::{Connection, TransportError};
use tokio::sync::mpsc;

use crate::DuoplexError;
use crate::lobby::LobbyHandle;

/// How long the writer may keep flushing after the session is gone.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that reports the session gone when the handler exits.
///
/// This ensures cleanup happens even if the handler panics or returns
/// early with `?`. Sending on an unbounded channel never blocks, so
/// `Drop` can do it directly.
struct SessionGuard {
    session: SessionId,
    lobby: LobbyHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.lobby.disconnect(self.session);
    }
}

/// Why the read loop stopped.
#[derive(Debug)]
enum ReadEnd {
    Closed,
    Failed(TransportError),
    Idle,
    WriterStopped,
    LobbyGone,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    lobby: LobbyHandle,
    idle_timeout: Option<Duration>,
) -> Result<(), DuoplexError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    let (outbound, queue) = mpsc::unbounded_channel();
    let session = lobby.connect(outbound)?;
    let guard = SessionGuard {
        session,
        lobby: lobby.clone(),
    };
    tracing::debug!(%conn_id, %session, "handling new connection");

    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), queue, session));

    let end = loop {
        let received = tokio::select! {
            received = recv_line(&*conn, idle_timeout) => received,
            _ = &mut writer => break ReadEnd::WriterStopped,
        };

        let line = match received {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => break ReadEnd::Closed,
            Ok(Err(e)) => break ReadEnd::Failed(e),
            Err(_) => break ReadEnd::Idle,
        };

        if lobby.line(session, line).is_err() {
            break ReadEnd::LobbyGone;
        }
    };

    match &end {
        ReadEnd::Closed => tracing::info!(%session, "connection closed cleanly"),
        ReadEnd::Failed(e) => tracing::debug!(%session, error = %e, "recv error"),
        ReadEnd::Idle => tracing::info!(%session, "connection idle, timing out"),
        ReadEnd::WriterStopped => tracing::debug!(%session, "writer stopped"),
        ReadEnd::LobbyGone => tracing::warn!(%session, "lobby gone"),
    }

    // The lobby unregisters the session, which closes the outbound queue;
    // the writer then flushes what is left and exits.
    drop(guard);
    if !matches!(end, ReadEnd::WriterStopped)
        && tokio::time::timeout(FLUSH_TIMEOUT, &mut writer).await.is_err()
    {
        tracing::debug!(%session, "peer not reading, abandoning queued replies");
        writer.abort();
    }

    if let Err(e) = conn.close().await {
        tracing::trace!(%session, error = %e, "close after disconnect");
    }
    Ok(())
}

/// One `recv`, bounded by the idle timeout when there is one.
async fn recv_line<C: Connection>(
    conn: &C,
    idle_timeout: Option<Duration>,
) -> Result<Result<Option<String>, TransportError>, tokio::time::error::Elapsed> {
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, conn.recv()).await,
        None => Ok(conn.recv().await),
    }
}

/// Sends queued lines in order until the queue closes or a send fails.
async fn write_loop<C: Connection>(
    conn: Arc<C>,
    mut queue: mpsc::UnboundedReceiver<String>,
    session: SessionId,
) {
    while let Some(line) = queue.recv().await {
        if let Err(e) = conn.send(&line).await {
            tracing::debug!(%session, error = %e, "send failed, dropping connection");
            return;
        }
    }
}
