//! Wire protocol for Broadside.
//!
//! This crate defines the line grammar that clients and the server speak:
//!
//! - **Commands** ([`ClientCommand`]): what a client may send.
//! - **Messages** ([`ServerMessage`]): what the server sends back.
//! - **Types** ([`Boat`], [`Shot`], [`Scoreboard`], [`MatchSnapshot`]):
//!   records carried as line arguments or embedded JSON.
//! - **Codec** ([`LineCodec`], [`TextCodec`]): the line ↔ message mapping.
//!
//! The protocol layer knows nothing about sockets or match rules. It sits
//! between the transport (framed lines) and the coordinator:
//!
//! ```text
//! Transport (lines) → Protocol (ClientCommand) → Coordinator
//! ```

mod codec;
mod command;
mod error;
mod message;
mod types;

pub use codec::{LineCodec, TextCodec};
pub use command::{ClientCommand, MAX_NAME_LEN};
pub use error::ProtocolError;
pub use message::ServerMessage;
pub use types::{
    Boat, MatchSnapshot, Role, SNAPSHOT_VERSION, ScoreEntry, Scoreboard, Shot,
    decode_fleet,
};
