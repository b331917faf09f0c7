//! Targeted and broadcast delivery over the registry's bindings.
//!
//! A delivery only pushes onto an unbounded channel, so it never waits on
//! a socket. A dead connection shows up as an `Err` on `send_to` and as a
//! skipped recipient on the broadcasts; neither can stall the caller.

use broadside_protocol::{Role, ServerMessage};

use crate::{IdentityRegistry, SessionError};

/// Routes server messages to bound identities.
pub trait Notifier {
    /// Sends to one identity.
    ///
    /// # Errors
    /// [`SessionError::NotBound`] if nobody is bound to `name`, or
    /// [`SessionError::Undeliverable`] if its connection has closed.
    fn send_to(&self, name: &str, message: ServerMessage) -> Result<(), SessionError>;

    /// Sends to every bound identity. Returns how many accepted it.
    fn send_all(&self, message: &ServerMessage) -> usize;

    /// Sends to every OBSERVER identity. Returns how many accepted it.
    fn send_observers(&self, message: &ServerMessage) -> usize;
}

impl IdentityRegistry {
    fn broadcast(&self, message: &ServerMessage, role: Option<Role>) -> usize {
        let mut delivered = 0;
        for (name, binding) in self.iter() {
            if role.is_some_and(|r| r != binding.role) {
                continue;
            }
            match binding.deliver(name, message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(error = %e, "broadcast skipped"),
            }
        }
        delivered
    }
}

impl Notifier for IdentityRegistry {
    fn send_to(&self, name: &str, message: ServerMessage) -> Result<(), SessionError> {
        let binding = self
            .get(name)
            .ok_or_else(|| SessionError::NotBound(name.to_string()))?;
        binding.deliver(name, message)
    }

    fn send_all(&self, message: &ServerMessage) -> usize {
        self.broadcast(message, None)
    }

    fn send_observers(&self, message: &ServerMessage) -> usize {
        self.broadcast(message, Some(Role::Observer))
    }
}
