//! Inbound commands and their line parser.

use std::str::FromStr;

use crate::{FIELD_SEPARATOR, ProtocolError};

/// A request from a client, parsed from one protocol line.
///
/// | Line | Variant |
/// |---|---|
/// | `LOGIN|u|p` | [`Command::Login`] |
/// | `CREATE_ACCOUNT|u|p` | [`Command::CreateAccount`] |
/// | `JOIN_OR_CREATE_ROOM|name` | [`Command::JoinOrCreateRoom`] |
/// | `LEAVE_ROOM` | [`Command::LeaveRoom`] |
/// | `MOVE|symbol|index` | [`Command::Move`] |
///
/// Command names are case-sensitive and the argument count must match
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in to an existing account.
    Login { username: String, password: String },

    /// Register a new account.
    CreateAccount { username: String, password: String },

    /// Join the named room, creating it if nobody is in it yet.
    JoinOrCreateRoom { room: String },

    /// Leave whatever room the sender is in.
    LeaveRoom,

    /// Relay a move to everyone in the sender's room.
    ///
    /// The server never interprets `symbol` or `index`; they are echoed
    /// back verbatim, so `index` is only checked to be a number.
    Move { symbol: String, index: i32 },
}

impl Command {
    /// The wire name of this command, as it appears in the first field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::CreateAccount { .. } => "CREATE_ACCOUNT",
            Self::JoinOrCreateRoom { .. } => "JOIN_OR_CREATE_ROOM",
            Self::LeaveRoom => "LEAVE_ROOM",
            Self::Move { .. } => "MOVE",
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut fields = line.split(FIELD_SEPARATOR);
        // `split` always yields at least one item, even for "".
        let name = fields.next().unwrap_or_default();
        let args: Vec<&str> = fields.collect();

        match name {
            "LOGIN" => {
                let [username, password] = expect_args("LOGIN", &args)?;
                Ok(Self::Login {
                    username: username.to_owned(),
                    password: password.to_owned(),
                })
            }
            "CREATE_ACCOUNT" => {
                let [username, password] =
                    expect_args("CREATE_ACCOUNT", &args)?;
                Ok(Self::CreateAccount {
                    username: username.to_owned(),
                    password: password.to_owned(),
                })
            }
            "JOIN_OR_CREATE_ROOM" => {
                let [room] = expect_args("JOIN_OR_CREATE_ROOM", &args)?;
                if room.is_empty() {
                    return Err(ProtocolError::InvalidField {
                        field: "room name",
                        value: room.to_owned(),
                    });
                }
                Ok(Self::JoinOrCreateRoom {
                    room: room.to_owned(),
                })
            }
            "LEAVE_ROOM" => {
                let [] = expect_args("LEAVE_ROOM", &args)?;
                Ok(Self::LeaveRoom)
            }
            "MOVE" => {
                let [symbol, index] = expect_args("MOVE", &args)?;
                // Whitespace around the number is allowed.
                let index = index.trim().parse::<i32>().map_err(|_| {
                    ProtocolError::InvalidField {
                        field: "move index",
                        value: index.to_owned(),
                    }
                })?;
                Ok(Self::Move {
                    symbol: symbol.to_owned(),
                    index,
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        }
    }
}

/// Checks the argument count and hands the arguments back as an array,
/// so each arm can destructure exactly what it needs.
fn expect_args<'a, const N: usize>(
    command: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(args).map_err(|_| ProtocolError::Arity {
        command,
        expected: N,
        got: args.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ProtocolError> {
        line.parse()
    }

    // =====================================================================
    // Well-formed lines
    // =====================================================================

    #[test]
    fn test_parse_login() {
        assert_eq!(
            parse("LOGIN|alice|pw").unwrap(),
            Command::Login {
                username: "alice".into(),
                password: "pw".into(),
            }
        );
    }

    #[test]
    fn test_parse_create_account() {
        assert_eq!(
            parse("CREATE_ACCOUNT|bob|x").unwrap(),
            Command::CreateAccount {
                username: "bob".into(),
                password: "x".into(),
            }
        );
    }

    #[test]
    fn test_parse_join_or_create_room() {
        assert_eq!(
            parse("JOIN_OR_CREATE_ROOM|r1").unwrap(),
            Command::JoinOrCreateRoom { room: "r1".into() }
        );
    }

    #[test]
    fn test_parse_leave_room_without_args() {
        assert_eq!(parse("LEAVE_ROOM").unwrap(), Command::LeaveRoom);
    }

    #[test]
    fn test_parse_move_with_numeric_index() {
        assert_eq!(
            parse("MOVE|X|4").unwrap(),
            Command::Move {
                symbol: "X".into(),
                index: 4,
            }
        );
    }

    #[test]
    fn test_parse_move_index_surrounding_spaces_trimmed() {
        assert_eq!(
            parse("MOVE|X| 4 ").unwrap(),
            Command::Move {
                symbol: "X".into(),
                index: 4,
            }
        );
    }

    #[test]
    fn test_parse_move_index_inner_space_rejected() {
        assert!(matches!(
            parse("MOVE|X|1 2"),
            Err(ProtocolError::InvalidField { field: "move index", .. })
        ));
    }

    #[test]
    fn test_parse_move_accepts_negative_index() {
        // The relay does no legality checks; any i32 goes through.
        assert_eq!(
            parse("MOVE|O|-1").unwrap(),
            Command::Move {
                symbol: "O".into(),
                index: -1,
            }
        );
    }

    #[test]
    fn test_parse_strips_line_terminator() {
        assert_eq!(parse("LEAVE_ROOM\r\n").unwrap(), Command::LeaveRoom);
        assert_eq!(
            parse("LOGIN|alice|pw\n").unwrap(),
            Command::Login {
                username: "alice".into(),
                password: "pw".into(),
            }
        );
    }

    #[test]
    fn test_parse_password_keeps_inner_spaces() {
        let cmd = parse("LOGIN|alice|two words").unwrap();
        assert!(matches!(
            cmd,
            Command::Login { password, .. } if password == "two words"
        ));
    }

    // =====================================================================
    // Malformed lines
    // =====================================================================

    #[test]
    fn test_parse_empty_line_returns_empty() {
        assert_eq!(parse(""), Err(ProtocolError::Empty));
        assert_eq!(parse("   \r\n"), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_parse_unknown_command_returns_error() {
        assert_eq!(
            parse("FLY|to|moon"),
            Err(ProtocolError::UnknownCommand("FLY".into()))
        );
    }

    #[test]
    fn test_parse_command_names_are_case_sensitive() {
        assert!(matches!(
            parse("login|alice|pw"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_login_missing_password_returns_arity() {
        assert_eq!(
            parse("LOGIN|alice"),
            Err(ProtocolError::Arity {
                command: "LOGIN",
                expected: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn test_parse_leave_room_with_extra_field_returns_arity() {
        assert_eq!(
            parse("LEAVE_ROOM|r1"),
            Err(ProtocolError::Arity {
                command: "LEAVE_ROOM",
                expected: 0,
                got: 1,
            })
        );
    }

    #[test]
    fn test_parse_move_with_extra_field_returns_arity() {
        assert!(matches!(
            parse("MOVE|X|4|5"),
            Err(ProtocolError::Arity { command: "MOVE", got: 3, .. })
        ));
    }

    #[test]
    fn test_parse_move_non_numeric_index_returns_invalid_field() {
        assert_eq!(
            parse("MOVE|X|four"),
            Err(ProtocolError::InvalidField {
                field: "move index",
                value: "four".into(),
            })
        );
    }

    #[test]
    fn test_parse_join_empty_room_name_returns_invalid_field() {
        assert!(matches!(
            parse("JOIN_OR_CREATE_ROOM|"),
            Err(ProtocolError::InvalidField { field: "room name", .. })
        ));
    }

    #[test]
    fn test_command_name_matches_wire_name() {
        for line in [
            "LOGIN|a|b",
            "CREATE_ACCOUNT|a|b",
            "JOIN_OR_CREATE_ROOM|r",
            "LEAVE_ROOM",
            "MOVE|X|0",
        ] {
            let cmd = parse(line).unwrap();
            assert!(line.starts_with(cmd.name()), "{line} vs {}", cmd.name());
        }
    }
}
