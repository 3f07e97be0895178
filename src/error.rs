//! Error types for the upload pipeline.
//!
//! Library modules return the specific errors below; the binary wraps them
//! with `anyhow` context. Per-track errors never escape the batch loop: they
//! are converted into a `ProcessingOutcome` or `ArchiveStatus`. Only the
//! umbrella [`Error`] aborts a run.

use std::path::PathBuf;

use crate::models::FailureReason;

pub type Result<T> = std::result::Result<T, Error>;

/// Run-level error. Anything that surfaces as this stops the batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lyrics service unreachable: {0}")]
    Unreachable(#[source] StoreError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{role} directory does not exist: {path}")]
    MissingDir { role: &'static str, path: PathBuf },

    #[error("cannot create {role} directory {path}: {source}")]
    CreateDir {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    UnsafeLayout(String),

    #[error("match threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("single file not found: {0}")]
    SingleFileMissing(PathBuf),

    #[error("cannot parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("cannot read tags from {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("missing {field} tag in {path}")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("invalid duration in {path}")]
    InvalidDuration { path: PathBuf },
}

// ============================================================================
// Remote store
// ============================================================================

/// Failure of a single call against the lyrics service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<StoreError> for FailureReason {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Network(msg) => FailureReason::Network(msg),
            StoreError::Service { status, message } => FailureReason::Service { status, message },
            StoreError::Decode(msg) => FailureReason::Decode(msg),
        }
    }
}

// ============================================================================
// Proof of work
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("challenge request failed: {0}")]
    Challenge(#[from] StoreError),

    #[error("malformed challenge target '{0}'")]
    BadTarget(String),

    #[error("no nonce satisfied the target within {0} attempts")]
    Exhausted(u64),
}

// ============================================================================
// Archive
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("refusing to overwrite existing file {0}")]
    DestinationExists(PathBuf),

    #[error("source file is missing: {0}")]
    SourceMissing(PathBuf),

    #[error("failed to move {from} -> {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audio file already sits in the done directory; the lyric did not follow.
    #[error("audio archived to {audio} but lyric was not: {cause}")]
    Partial {
        audio: PathBuf,
        #[source]
        cause: Box<ArchiveError>,
    },
}

impl ArchiveError {
    pub fn is_partial(&self) -> bool {
        matches!(self, ArchiveError::Partial { .. })
    }
}

// ============================================================================
// Journal
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
