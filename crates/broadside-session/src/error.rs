//! Error types for the session layer.

use broadside_transport::ConnectionId;

/// Errors that can occur while binding identities or routing messages.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live connection is bound to this name.
    #[error("no connection bound to {0}")]
    NotBound(String),

    /// The name has since been rebound to a newer connection, so the
    /// caller's connection no longer owns it.
    #[error("{conn} no longer owns {name}")]
    StaleConnection { name: String, conn: ConnectionId },

    /// The binding exists but its writer has gone away.
    #[error("connection for {0} is closed")]
    Undeliverable(String),
}
