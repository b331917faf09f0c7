//! Client → server commands.

use crate::types::decode_fleet;
use crate::{Boat, ProtocolError, Role};

/// Longest identity name accepted by `JOIN` and `RECONNECT`.
pub const MAX_NAME_LEN: usize = 32;

/// A decoded client line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `JOIN <name> [PLAYER|OBSERVER]`. The role defaults to PLAYER.
    Join { name: String, role: Role },

    /// `READY [<json array of boats>]`. `None` asks the server to place
    /// a random fleet.
    Ready { fleet: Option<Vec<Boat>> },

    /// `PLAY <x> <y>`, 1-based. Kept signed and wide so out-of-range
    /// values reach the bounds check instead of failing as parse errors.
    Play { x: i64, y: i64 },

    /// `RECONNECT <name>`.
    Reconnect { name: String },

    /// `QUIT`.
    Quit,
}

impl ClientCommand {
    /// Parses one line (terminator already stripped).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match keyword.to_ascii_uppercase().as_str() {
            "JOIN" => match args.as_slice() {
                [name] => Ok(Self::Join {
                    name: parse_name(name)?,
                    role: Role::Player,
                }),
                [name, role] => Ok(Self::Join {
                    name: parse_name(name)?,
                    role: role.parse()?,
                }),
                _ => Err(ProtocolError::Usage("JOIN <name> [PLAYER|OBSERVER]")),
            },
            "READY" => {
                // The payload is raw JSON and may itself contain spaces.
                let fleet = if rest.is_empty() {
                    None
                } else {
                    Some(decode_fleet(rest)?)
                };
                Ok(Self::Ready { fleet })
            }
            "PLAY" => match args.as_slice() {
                [x, y] => Ok(Self::Play {
                    x: parse_coordinate(x)?,
                    y: parse_coordinate(y)?,
                }),
                _ => Err(ProtocolError::Usage("PLAY <x> <y>")),
            },
            "RECONNECT" => match args.as_slice() {
                [name] => Ok(Self::Reconnect {
                    name: parse_name(name)?,
                }),
                _ => Err(ProtocolError::Usage("RECONNECT <name>")),
            },
            "QUIT" if args.is_empty() => Ok(Self::Quit),
            "QUIT" => Err(ProtocolError::Usage("QUIT")),
            _ => Err(ProtocolError::UnknownCommand(keyword.to_string())),
        }
    }
}

fn parse_name(raw: &str) -> Result<String, ProtocolError> {
    if raw.chars().count() > MAX_NAME_LEN {
        return Err(ProtocolError::InvalidArgument(format!(
            "name longer than {MAX_NAME_LEN} characters"
        )));
    }
    if raw.chars().any(char::is_control) {
        return Err(ProtocolError::InvalidArgument(
            "name contains control characters".into(),
        ));
    }
    Ok(raw.to_string())
}

fn parse_coordinate(raw: &str) -> Result<i64, ProtocolError> {
    raw.parse().map_err(|_| {
        ProtocolError::InvalidArgument(format!(
            "coordinate must be an integer, got {raw}"
        ))
    })
}
