//! Error types for the protocol layer.
//!
//! Every variant is a protocol error in the client's sense: the line was
//! malformed, so it is answered with `ERROR <display text>` and the
//! connection stays open.

/// Errors that can occur while decoding commands or encoding replies.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The first word of the line is not a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of arguments. Carries the expected usage.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// An argument has the right position but the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An embedded JSON payload could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// A versioned payload carries a version this build doesn't speak.
    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u32),

    /// Serializing an outgoing payload failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
