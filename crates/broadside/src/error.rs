//! Unified error type for the Broadside server.

use broadside_game::GameError;
use broadside_ledger::LedgerError;
use broadside_protocol::ProtocolError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The display text doubles as the `ERROR <text>` reply for everything a
/// client can cause, so the wrapped variants stay transparent.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Another live connection already speaks for this name.
    #[error("name already in use")]
    NameInUse(String),

    /// This connection already holds an identity.
    #[error("already joined as {0}")]
    AlreadyJoined(String),

    /// The command needs an identity and the connection has none.
    #[error("send JOIN first")]
    NotJoined,
}
