//! Error taxonomy for the ingestion pipeline.
//!
//! Each pipeline stage fails with its own type so the orchestrator can route
//! on the failure kind:
//!
//! | Error | Raised by | Effect on the run |
//! |-------|-----------|-------------------|
//! | [`SourceError`] | source listing | source skipped, others still tried |
//! | [`FetchError`] | content fetch | fallback |
//! | [`SelectionError`] | selector | fallback |
//! | [`StorageError`] | local read/write, provenance | fatal |
//! | [`PublishError`] | publisher | fatal; uncommitted writes are rolled back |
//!
//! [`RunError`] carries whichever fatal error ended a run.

use std::path::PathBuf;

use thiserror::Error;

/// A source could not list its candidates.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// The chosen candidate's content could not be retrieved.
#[derive(Debug, Error)]
#[error("failed to fetch '{path}' from '{source_name}': {reason}")]
pub struct FetchError {
    pub source_name: String,
    pub path: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(source_name: impl Into<String>, path: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            source_name: source_name.into(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// No unprocessed candidate exists across the enabled sources.
#[derive(Debug, Error)]
#[error("no unprocessed candidates across {sources} source(s)")]
pub struct SelectionError {
    pub sources: usize,
}

/// Local storage could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed provenance file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("workspace root is not a directory: {}", .0.display())]
    Inaccessible(PathBuf),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The changeset could not be persisted or published.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("nothing to publish")]
    NothingToPublish,

    #[error("failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {stderr}")]
    Git { command: String, stderr: String },

    /// The changeset is committed locally; only the push failed.
    #[error("committed {commit} but push failed: {source}")]
    PushFailed {
        commit: String,
        #[source]
        source: Box<PublishError>,
    },
}

impl PublishError {
    /// Commit id when the changeset landed despite the error.
    pub fn committed(&self) -> Option<&str> {
        match self {
            PublishError::PushFailed { commit, .. } => Some(commit),
            _ => None,
        }
    }
}

/// Why the primary ingestion path produced no artifact.
///
/// Every variant routes the run to the fallback generator.
#[derive(Debug, Error)]
pub enum PrimaryError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Why a run ended in the failed state.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
