//! Server → client messages.

use crate::{MatchSnapshot, ProtocolError, Scoreboard};

/// Everything the server can say to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Greeting sent as soon as a connection is accepted.
    Welcome,
    /// The identity holds seat `0` or `1`.
    AssignedPlayer(usize),
    /// The identity only watches.
    AssignedObserver,
    Scoreboard(Scoreboard),
    /// Both fleets are in; the match begins.
    Start,
    YourTurn,
    Wait,
    /// Outcome of the recipient's own shot.
    Result { hit: bool },
    /// A shot fired by someone else.
    OpponentPlayed { x: u8, y: u8, hit: bool },
    /// Full snapshot for a reconnecting player.
    State(Box<MatchSnapshot>),
    Win,
    Lose,
    Info(String),
    Error(String),
}

impl ServerMessage {
    /// Convenience constructor for `INFO`.
    pub fn info(text: impl Into<String>) -> Self {
        Self::Info(text.into())
    }

    /// Convenience constructor for `ERROR`.
    pub fn error(text: impl ToString) -> Self {
        Self::Error(text.to_string())
    }

    /// Renders the message as one protocol line, without the terminator.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let line = match self {
            Self::Welcome => "WELCOME".to_string(),
            Self::AssignedPlayer(slot) => format!("ASSIGNED PLAYER {slot}"),
            Self::AssignedObserver => "ASSIGNED OBSERVER".to_string(),
            Self::Scoreboard(board) => format!(
                "SCOREBOARD {}",
                serde_json::to_string(board).map_err(ProtocolError::Encode)?
            ),
            Self::Start => "START".to_string(),
            Self::YourTurn => "YOUR_TURN".to_string(),
            Self::Wait => "WAIT".to_string(),
            Self::Result { hit } => format!("RESULT {}", flag(*hit)),
            Self::OpponentPlayed { x, y, hit } => {
                format!("OPPONENT_PLAYED {x} {y} {}", flag(*hit))
            }
            Self::State(snapshot) => format!(
                "STATE {}",
                serde_json::to_string(snapshot)
                    .map_err(ProtocolError::Encode)?
            ),
            Self::Win => "WIN".to_string(),
            Self::Lose => "LOSE".to_string(),
            Self::Info(text) => format!("INFO {}", single_line(text)),
            Self::Error(text) => format!("ERROR {}", single_line(text)),
        };
        Ok(line)
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Free text must not break the line framing.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
