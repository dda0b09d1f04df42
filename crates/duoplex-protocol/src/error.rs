//! Error types for the protocol layer.
//!
//! Each crate in Duoplex defines its own error enum. When you see a
//! `ProtocolError`, you know the line itself was bad,
//! whatever state the session was in.

/// Why an inbound line could not be turned into a [`Command`](crate::Command).
///
/// None of these are fatal: the dispatcher logs the error, drops the
/// line, and keeps the connection open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The line was empty (or only whitespace).
    #[error("empty line")]
    Empty,

    /// The first field names no known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command is known but carries the wrong number of arguments.
    #[error("{command} expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    /// An argument is present but its value is unusable, e.g. a MOVE
    /// index that isn't a number.
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}
