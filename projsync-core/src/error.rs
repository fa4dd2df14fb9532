//! Error types for projsync-core.
//!
//! Read-path failures degrade to neutral defaults inside the facade; only
//! write-path and first-load failures reach callers.

use camino::Utf8PathBuf;
use thiserror::Error;

/// The top-level error type for projsync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The host cannot answer this query for the project kind.
    #[error("operation not supported for this project")]
    UnsupportedOperation,

    /// Version control could not be reached.
    #[error("version control unavailable: {message}")]
    VersionControlUnavailable { message: String },

    /// Writing the document failed. The in-memory document keeps the mutation.
    #[error("failed to persist {path}: {source:#}")]
    PersistenceFailure {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("build document not found: {path}")]
    DocumentNotFound { path: Utf8PathBuf },

    #[error("failed to parse {path}: {message}")]
    ParseFailure { path: Utf8PathBuf, message: String },

    /// A mutation was started while the same registry was already mutating.
    #[error("document {path} is already being updated")]
    Busy { path: Utf8PathBuf },

    #[error("unknown integration: {name}")]
    UnknownIntegration { name: String },
}

impl SyncError {
    /// Returns true for failures a best-effort read query may replace with a default.
    pub fn is_read_degradable(&self) -> bool {
        !matches!(self, SyncError::PersistenceFailure { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::UnsupportedOperation | SyncError::UnknownIntegration { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
