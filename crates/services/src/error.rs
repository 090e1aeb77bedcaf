//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use hub_core::model::DisciplineId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by curriculum sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("no curriculum for discipline {0}")]
    NotFound(DisciplineId),
    #[error("failed to read curriculum {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed curriculum {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("curriculum file for {expected} describes {found}")]
    Mismatch {
        expected: DisciplineId,
        found: DisciplineId,
    },
}

/// Errors emitted by `ProgressSynchronizer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("progress not saved: {0}")]
    StoreUnavailable(#[from] StorageError),
    #[error("invalid progress change: {0}")]
    InvalidPatch(String),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
    #[error("progress write interrupted: {0}")]
    Interrupted(String),
}

impl SyncError {
    /// Whether the caller may reasonably retry the same mutation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_) | SyncError::Interrupted(_))
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SyncError::InvalidPatch(reason.into())
    }
}

impl From<hub_core::Error> for SyncError {
    fn from(err: hub_core::Error) -> Self {
        SyncError::InvalidPatch(err.to_string())
    }
}

/// Errors emitted while bootstrapping hub services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HubServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
