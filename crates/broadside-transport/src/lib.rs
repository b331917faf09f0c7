//! Transport abstraction layer for Broadside.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the listening socket and a single peer. The only implementation is
//! newline-framed TCP ([`TcpLineTransport`], [`TcpLineConnection`]): every
//! message is one UTF-8 line terminated by `\n`.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{DEFAULT_MAX_LINE_LEN, TcpLineConnection, TcpLineTransport};

use std::fmt;

/// Identifies one accepted socket for the lifetime of the process.
///
/// Bindings are matched on this, so a name that moved to a new socket is
/// never unbound by the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges text lines with its peer.
///
/// `send` and `recv` may run concurrently from different tasks: a reader
/// loop blocked in `recv` never holds up a writer.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one line to the remote peer. The terminator is appended.
    async fn send(&self, line: &str) -> Result<(), Self::Error>;

    /// Receives the next line from the remote peer, without its terminator.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the write side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
