//! Codec trait and the text implementation used on the wire.
//!
//! The handler never parses or formats lines itself; it goes through a
//! [`LineCodec`]. That keeps the connection loop independent of the exact
//! line grammar and makes the grammar testable without sockets.

use crate::{ClientCommand, ProtocolError, ServerMessage};

/// Converts between protocol lines and typed messages.
///
/// Lines handed to [`decode`](LineCodec::decode) have already lost their
/// terminator, and lines returned by [`encode`](LineCodec::encode) must
/// not contain one; framing belongs to the transport.
pub trait LineCodec: Send + Sync + 'static {
    /// Parses one inbound line.
    ///
    /// # Errors
    /// Any [`ProtocolError`] here is recoverable: the client gets an
    /// `ERROR` reply and may try again.
    fn decode(&self, line: &str) -> Result<ClientCommand, ProtocolError>;

    /// Renders one outbound message.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if an embedded payload fails
    /// to serialize.
    fn encode(&self, message: &ServerMessage) -> Result<String, ProtocolError>;
}

/// The space-separated keyword grammar with compact JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl LineCodec for TextCodec {
    fn decode(&self, line: &str) -> Result<ClientCommand, ProtocolError> {
        ClientCommand::parse(line)
    }

    fn encode(&self, message: &ServerMessage) -> Result<String, ProtocolError> {
        message.encode()
    }
}
