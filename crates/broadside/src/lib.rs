//! # Broadside
//!
//! Two-player battleship match server over a newline-delimited TCP
//! protocol.
//!
//! Clients JOIN as PLAYER or OBSERVER, the two players submit fleets with
//! READY, then alternate PLAY shots until one side has hit every cell of
//! the other's fleet. Wins and losses are kept in a JSON score file that
//! survives restarts, and a dropped player can RECONNECT by name to get
//! the full match state back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn start() -> Result<(), BroadsideError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:5000")
//!     .rules(FleetRules::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod coordinator;
mod error;
mod handler;
mod server;

pub use coordinator::Coordinator;
pub use error::BroadsideError;
pub use server::{DEFAULT_BIND_ADDR, Server, ServerBuilder};

/// Convenience re-exports for embedding the server.
pub mod prelude {
    pub use crate::{BroadsideError, DEFAULT_BIND_ADDR, Server, ServerBuilder};
    pub use broadside_game::{FleetRules, MatchPhase};
    pub use broadside_protocol::{
        Boat, ClientCommand, LineCodec, Role, ServerMessage, TextCodec,
    };
}
