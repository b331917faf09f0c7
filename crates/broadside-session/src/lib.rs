//! Identity management for Broadside.
//!
//! This crate answers "who is connected as what, and how do I reach
//! them?":
//!
//! 1. **Binding**: a name is tied to one live connection and a role
//!    ([`IdentityRegistry`], [`Binding`]).
//! 2. **Rebinding**: reconnection moves a name onto a new connection;
//!    the old connection can no longer unbind it.
//! 3. **Routing**: targeted and broadcast sends ([`Notifier`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← decides what to say and to whom
//!     ↕
//! Session Layer (this crate)  ← maps names to outboxes
//!     ↕
//! Protocol Layer (below)  ← provides Role, ServerMessage
//! ```

mod error;
mod notifier;
mod registry;

pub use error::SessionError;
pub use notifier::Notifier;
pub use registry::{Binding, IdentityRegistry, Outbox};
