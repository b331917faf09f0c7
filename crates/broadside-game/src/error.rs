//! Error types for the game layer.
//!
//! The display text of each variant is what the client sees after
//! `ERROR`, so keep them short and lowercase.

/// A rule violation. None of these leave the match changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The match is in the lobby or already concluded.
    #[error("match is not in progress")]
    NotInProgress,

    /// Fleets can only be submitted in the lobby.
    #[error("match already in progress")]
    AlreadyStarted,

    /// The identity holds no seat.
    #[error("{0} is not a player")]
    NotAPlayer(String),

    /// The shooter is seated but it is the other seat's turn.
    #[error("not your turn")]
    NotYourTurn,

    #[error("coordinate ({x}, {y}) is outside the {size}x{size} board")]
    OutOfBounds { x: i64, y: i64, size: u8 },

    #[error("already fired at ({x}, {y})")]
    AlreadyFired { x: u8, y: u8 },

    #[error("fleet already submitted")]
    FleetAlreadySubmitted,

    #[error("invalid fleet: {0}")]
    InvalidFleet(String),

    /// The configured rules describe a fleet that can never be placed.
    #[error("invalid rules: {0}")]
    InvalidRules(String),

    /// Reconnection needs a recorded fleet; it never creates a seat.
    #[error("unknown player to reconnect")]
    UnknownPlayer(String),
}
