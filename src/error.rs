//! Centralized error handling with typed error enums.
//!
//! Each subsystem owns a small error enum; [`MnemeError`] is the top-level
//! type the CLI maps to exit codes. Errors provide detailed context via
//! `Debug` for logging and user-facing messages via `Display`.
//!
//! # Error hierarchy
//!
//! ```text
//! MnemeError (top-level)
//! ├── Crawl(CrawlError)      - Filesystem traversal
//! ├── Ingest(IngestError)    - Document source reads
//! ├── Store(StoreError)      - Chunk / manifest / tombstone storage
//! ├── Lock(LockError)        - Writer exclusion
//! ├── Version(VersionError)  - Store compatibility
//! └── Internal               - Unexpected internal errors
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for mneme operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()`
/// and `.with_context()` throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Exit code for user/input errors.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when another writer holds the data-directory lock.
pub const EXIT_LOCK_HELD: i32 = 2;
/// Exit code for storage-version incompatibility.
pub const EXIT_VERSION_MISMATCH: i32 = 3;

/// Primary error type for CLI-facing operations.
#[derive(Debug, Error)]
pub enum MnemeError {
    /// Filesystem traversal errors.
    #[error("{0}")]
    Crawl(#[from] CrawlError),

    /// Document source errors.
    #[error("{0}")]
    Ingest(#[from] IngestError),

    /// Chunk, manifest, or tombstone storage errors.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Writer-exclusion errors.
    #[error("{0}")]
    Lock(#[from] LockError),

    /// Store compatibility errors.
    #[error("{0}")]
    Version(#[from] VersionError),

    /// Internal/unexpected errors.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl MnemeError {
    /// Create an internal error from a message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Lock(LockError::Held { .. }) => EXIT_LOCK_HELD,
            Self::Version(VersionError::StorageMismatch { .. }) => EXIT_VERSION_MISMATCH,
            _ => EXIT_FAILURE,
        }
    }

    /// Optional guidance for resolving the error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::Store(e) => e.help(),
            Self::Lock(e) => e.help(),
            Self::Version(e) => e.help(),
            _ => None,
        }
    }

    /// User-facing message with help text appended when available.
    pub fn user_message(&self) -> String {
        match self.help() {
            Some(help) => format!("{}\n\n{}", self, help),
            None => self.to_string(),
        }
    }
}

/// Errors raised while walking source trees.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The crawl root does not exist.
    #[error("Path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// A directory could not be read.
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by document sources.
///
/// `NotFound` is deliberately distinct: the ingestor registry continues to
/// the next source on it and aborts on anything else.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document is unknown to this source.
    #[error("Document not found: {id}")]
    NotFound { id: String },

    /// The source failed to produce the document.
    #[error("Failed to read document {id}")]
    Read {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// No enabled source could produce the document.
    #[error("Document not found in any enabled source: {id}")]
    Exhausted { id: String },
}

/// Errors raised by the chunk and manifest store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing has been indexed yet.
    #[error("no segments found: please run index first")]
    NoSegments,

    /// A chunk, manifest, or VERSION file failed to decode.
    #[error("Corrupt {what} at {path}: {reason}")]
    Corrupt {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// A storage read or write failed.
    #[error("Storage I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Optional guidance for resolving the error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::NoSegments => Some("Run `mneme index` to build the index."),
            Self::Corrupt { .. } => {
                Some("The store may be damaged. Re-run `mneme index` to rebuild it.")
            }
            Self::Io { .. } => None,
        }
    }
}

/// Errors raised by the data-directory lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another writer owns the lock.
    #[error("index is locked by process {process_id} on {hostname} since {acquired_at}")]
    Held {
        process_id: u32,
        hostname: String,
        acquired_at: String,
    },

    /// The lock directory could not be created or removed.
    #[error("Lock operation failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    /// Optional guidance for resolving the error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::Held { .. } => Some(
                "Another mneme process is writing to the index.\n\
                 If that process is gone, remove the lock directory under the data dir.",
            ),
            Self::Io { .. } => None,
        }
    }
}

/// Errors raised by VERSION-record compatibility checks.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Stored storage version disagrees with this binary.
    #[error("storage version mismatch: store has {stored}, this binary expects {current}")]
    StorageMismatch { stored: String, current: String },

    /// The VERSION record is unreadable.
    #[error("Invalid VERSION record: {reason}")]
    Invalid { reason: String },
}

impl VersionError {
    /// Optional guidance for resolving the error.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::StorageMismatch { .. } => Some(
                "The on-disk index was written by an incompatible version.\n\
                 Clear the data directory and re-run `mneme init`.",
            ),
            Self::Invalid { .. } => None,
        }
    }
}
