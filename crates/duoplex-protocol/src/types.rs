//! Identity types shared by every layer above the transport.

use std::fmt;

/// Separates the fields of a protocol line: `COMMAND|arg1|arg2`.
pub const FIELD_SEPARATOR: char = '|';

/// The server-assigned identity of one connected client.
///
/// A newtype over `u64` so it can't be confused with any other number
/// flowing through the server. The lobby hands one out when a connection
/// registers; rooms and the registry key everything by it, never by the
/// transport's own connection object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

/// `tracing::info!(%session, "joined")` prints "S-42 joined".
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_session_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(SessionId(1), "alice");
        map.insert(SessionId(2), "bob");
        assert_eq!(map[&SessionId(1)], "alice");
    }
}
