/// Errors from moving lines over a connection, or from the listener.
///
/// Each one ends the connection it happened on and nothing else.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer (or our side) already closed the connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a line to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading the next line failed (reset, or bytes that aren't UTF-8).
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener, or accepting and upgrading a client, failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
