//! Durable win/loss counters for Broadside.
//!
//! The ledger is a whole-file store: [`ScoreLedger::load`] reads the
//! entire JSON map at startup and [`ScoreLedger::save`] rewrites it after
//! every concluded match. The write goes to a sibling `.tmp` file which
//! is then renamed over the real one, so a crash mid-write leaves the
//! previous file intact. A crash before the rename still loses the most
//! recent match's delta.

mod error;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use broadside_protocol::Scoreboard;

pub use error::LedgerError;

/// identity → {wins, losses}, optionally backed by a file.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    path: Option<PathBuf>,
    scores: Scoreboard,
}

impl ScoreLedger {
    /// A ledger that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the ledger stored at `path`.
    ///
    /// A missing file starts an empty ledger. An unreadable or corrupt
    /// file is logged and also starts empty; the next save replaces it.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let scores = match read_scoreboard(&path).await {
            Ok(Some(scores)) => {
                tracing::info!(path = %path.display(), players = scores.len(), "scores loaded");
                scores
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no score file, starting empty");
                Scoreboard::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unusable score file");
                Scoreboard::new()
            }
        };
        Self {
            path: Some(path),
            scores,
        }
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scores
    }

    /// Applies one match result in memory.
    pub fn record_result(&mut self, winner: &str, loser: &str) {
        self.scores.entry(winner.to_string()).or_default().wins += 1;
        self.scores.entry(loser.to_string()).or_default().losses += 1;
        tracing::debug!(winner = %winner, loser = %loser, "result recorded");
    }

    /// Writes the whole scoreboard to disk. A no-op for in-memory ledgers.
    pub async fn save(&self) -> Result<(), LedgerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(&self.scores).map_err(LedgerError::Encode)?;
        let tmp = temp_path(path);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|source| LedgerError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| LedgerError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), players = self.scores.len(), "scores saved");
        Ok(())
    }
}

/// `Ok(None)` means the file does not exist.
async fn read_scoreboard(path: &Path) -> Result<Option<Scoreboard>, LedgerError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LedgerError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(LedgerError::Corrupt)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
