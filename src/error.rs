// File: src/error.rs
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// A walk was asked to continue from a token the chain has never led from.
    #[error("token {0:?} is not a leader in this chain")]
    UnknownToken(String),
    #[error("chain has no leaders to choose from")]
    EmptyChain,
    #[error("No dialog found.")]
    NoDialogFound,
    #[error("Speaker \"{speaker}\" has no known dialog.")]
    SpeakerNotFound { speaker: String },
}

impl Error {
    /// True for the "nothing to generate" kinds.
    pub fn is_no_dialog(&self) -> bool {
        matches!(self, Self::NoDialogFound | Self::SpeakerNotFound { .. })
    }

    /// Speaker named by a not-found error, if any.
    pub fn speaker(&self) -> Option<&str> {
        match self {
            Self::SpeakerNotFound { speaker } => Some(speaker),
            _ => None,
        }
    }
}
