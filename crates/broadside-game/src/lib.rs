//! Match rules for Broadside.
//!
//! Everything here is synchronous and free of I/O. The coordinator owns
//! one [`MatchState`] behind its lock and calls into it.
//!
//! # Key types
//!
//! - [`MatchState`]: seats, fleets, shot logs, turn, phase
//! - [`MatchPhase`]: lifecycle state machine
//! - [`PlayerOrder`]: the two ordered seats
//! - [`FleetRules`]: board size and ship lengths
//! - [`validate_fleet`], [`is_hit`], [`generate_fleet`]: fleet helpers

mod config;
mod error;
mod fleet;
mod order;
mod state;

pub use config::{FleetRules, MatchPhase};
pub use error::GameError;
pub use fleet::{generate_fleet, is_hit, validate_fleet};
pub use order::PlayerOrder;
pub use state::{FleetOutcome, MatchState, ShotOutcome};
