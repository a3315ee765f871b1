use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("no pdm project found at or above {path}")]
    NoProjectContext { path: String },

    #[error("no active interpreter recorded for {root} ({marker} is missing or empty)")]
    MarkerFileMissing {
        root: Utf8PathBuf,
        marker: Utf8PathBuf,
    },

    #[error("failed to read {marker}: {source}")]
    MarkerFileUnreadable {
        marker: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to locate the venv storage root for {root}: {reason}")]
    StorageRootUnavailable { root: Utf8PathBuf, reason: String },

    #[error("failed to list venv storage root {storage}: {source}")]
    StorageRootUnreadable {
        storage: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid pyproject.toml at {path}: {reason}")]
    InvalidPyproject { path: Utf8PathBuf, reason: String },

    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: String },
}

impl DomainError {
    /// Absence of the marker is the normal state before pdm first selects an
    /// interpreter; callers should not surface it as a failure.
    pub fn is_routine(&self) -> bool {
        matches!(self, DomainError::MarkerFileMissing { .. })
    }
}
