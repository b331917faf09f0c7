//! The identity registry: who is connected, as what, and where to send.
//!
//! A [`Binding`] ties a name to the connection currently speaking for it
//! and to that connection's outbox. The registry never owns sockets; it
//! holds the sending half of an unbounded channel, and the connection's
//! writer task drains the other half.
//!
//! # Concurrency note
//!
//! `IdentityRegistry` is a plain `HashMap` with no locking of its own. It
//! lives inside the coordinator's state and is only touched while the
//! coordination lock is held.

use std::collections::HashMap;

use broadside_protocol::{Role, ServerMessage};
use broadside_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// The sending half of a connection's message queue.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// One name's current routing entry.
#[derive(Debug, Clone)]
pub struct Binding {
    pub role: Role,
    pub conn: ConnectionId,
    outbox: Outbox,
}

impl Binding {
    pub fn new(role: Role, conn: ConnectionId, outbox: Outbox) -> Self {
        Self { role, conn, outbox }
    }

    /// Queues a message for the connection's writer.
    pub(crate) fn deliver(
        &self,
        name: &str,
        message: ServerMessage,
    ) -> Result<(), SessionError> {
        self.outbox
            .send(message)
            .map_err(|_| SessionError::Undeliverable(name.to_string()))
    }

    /// Returns `true` while the writer side is still draining the outbox.
    pub fn is_live(&self) -> bool {
        !self.outbox.is_closed()
    }
}

/// Maps identity names to their live bindings.
///
/// ```text
///  bind() ──→ [bound] ──→ unregister(conn) ──→ [unbound]
///                │                                 │
///                └──── bind() again (rebind) ◀─────┘
/// ```
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    bindings: HashMap<String, Binding>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a connection, replacing any previous binding.
    ///
    /// Returns the binding that was replaced, if any. Rebinding is how
    /// reconnection moves an identity onto a fresh socket.
    pub fn bind(&mut self, name: &str, binding: Binding) -> Option<Binding> {
        tracing::info!(
            name = %name,
            conn = %binding.conn,
            role = %binding.role,
            "identity bound"
        );
        self.bindings.insert(name.to_string(), binding)
    }

    /// Removes the binding for `name`, but only if `conn` still owns it.
    ///
    /// A connection that lost its name to a reconnect must not unbind the
    /// newer connection when it finally closes.
    ///
    /// # Errors
    /// - [`SessionError::NotBound`]: nothing is bound to `name`.
    /// - [`SessionError::StaleConnection`]: `name` belongs to another
    ///   connection now.
    pub fn unregister(
        &mut self,
        name: &str,
        conn: ConnectionId,
    ) -> Result<Binding, SessionError> {
        let current = self
            .bindings
            .get(name)
            .ok_or_else(|| SessionError::NotBound(name.to_string()))?;
        if current.conn != conn {
            return Err(SessionError::StaleConnection {
                name: name.to_string(),
                conn,
            });
        }

        let removed = self
            .bindings
            .remove(name)
            .ok_or_else(|| SessionError::NotBound(name.to_string()))?;
        tracing::info!(name = %name, %conn, "identity unbound");
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Returns `true` if `name` is bound to a connection whose writer is
    /// still running.
    pub fn is_connected(&self, name: &str) -> bool {
        self.bindings.get(name).is_some_and(Binding::is_live)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(name, b)| (name.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
