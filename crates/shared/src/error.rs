use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while gathering material for a brief.
///
/// Only `NotFound` and `JournalDir` are fatal to a run. The others are
/// downgraded to placeholder text at the component that owns them.
#[derive(Debug, Error)]
pub enum BriefError {
    #[error("No journal files found in {}", dir.display())]
    NotFound { dir: PathBuf },

    #[error("Failed to read journal directory {}: {source}", dir.display())]
    JournalDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8 text", path.display())]
    InvalidUtf8 { path: PathBuf },

    #[error("Decryption failed for {}: {status}", path.display())]
    DecryptionFailed { path: PathBuf, status: String },

    #[error("{0}")]
    FetchFailed(String),

    #[error("{0}")]
    GeneratorFailed(String),
}

impl BriefError {
    /// True for errors that leave the brief with nothing to work from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::JournalDir { .. })
    }
}

pub type BriefResult<T> = Result<T, BriefError>;
