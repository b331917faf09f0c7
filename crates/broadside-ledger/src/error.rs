//! Error types for the score ledger.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while reading or writing the score file.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("score file {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("score file {path} could not be written: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a scoreboard.
    #[error("score file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("scoreboard could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}
